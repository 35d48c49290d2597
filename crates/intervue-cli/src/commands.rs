//! Command parsing and dispatch.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use tracing::warn;

use intervue_core::models::{InitiatePaymentRequest, OtpRequest, SignInRequest, VerifyOtpRequest};
use intervue_core::{Config, QueryClient};

use crate::output::{explain, print_json, require};

pub const USAGE: &str = "\
Usage: intervue <command> [args]

Commands:
  login [email]                    Sign in (prompts for password; defaults to the last email)
  otp <email>                      Email a one-time passcode
  verify <email> <code>            Sign in with a one-time passcode
  logout                           Forget the stored session
  me                               Show the signed-in profile
  interviews                       List your interviews
  interview <id>                   Show one interview
  pay <plan-id> <amount> [currency] Start a payment (amount in minor units)
  payment-status <id> [--wait]     Show a payment, optionally until it settles
  vapi                             Check the voice-assistant connection
  help                             Show this message";

/// Default currency for `pay` when none is given
const DEFAULT_CURRENCY: &str = "INR";

/// Poll interval and bound for `payment-status --wait`
const PAYMENT_POLL_INTERVAL_SECS: u64 = 3;
const PAYMENT_MAX_POLLS: u32 = 40;

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Login { email: Option<String> },
    Otp { email: String },
    Verify { email: String, code: String },
    Logout,
    Me,
    Interviews,
    Interview { id: String },
    Pay { plan_id: String, amount: u64, currency: String },
    PaymentStatus { id: String, wait: bool },
    Vapi,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let command = match args.as_slice() {
            [] | ["help"] | ["--help"] | ["-h"] => Command::Help,
            ["login"] => Command::Login { email: None },
            ["login", email] => Command::Login {
                email: Some(email.to_string()),
            },
            ["otp", email] => Command::Otp { email: email.to_string() },
            ["verify", email, code] => Command::Verify {
                email: email.to_string(),
                code: code.to_string(),
            },
            ["logout"] => Command::Logout,
            ["me"] => Command::Me,
            ["interviews"] => Command::Interviews,
            ["interview", id] => Command::Interview { id: id.to_string() },
            ["pay", plan_id, amount, rest @ ..] if rest.len() <= 1 => Command::Pay {
                plan_id: plan_id.to_string(),
                amount: amount
                    .parse()
                    .with_context(|| format!("Invalid amount: {}", amount))?,
                currency: rest.first().unwrap_or(&DEFAULT_CURRENCY).to_uppercase(),
            },
            ["payment-status", id] => Command::PaymentStatus {
                id: id.to_string(),
                wait: false,
            },
            ["payment-status", id, "--wait"] => Command::PaymentStatus {
                id: id.to_string(),
                wait: true,
            },
            ["vapi"] => Command::Vapi,
            _ => bail!("Unrecognized command: {}", args.join(" ")),
        };
        Ok(command)
    }
}

pub async fn run(client: &QueryClient, config: &mut Config, command: Command) -> Result<()> {
    match command {
        Command::Help => println!("{}", USAGE),
        Command::Login { email } => {
            let email = match email.or_else(|| config.last_email.clone()) {
                Some(email) => email,
                None => bail!("Email required: intervue login <email>"),
            };
            let password = rpassword::prompt_password("Password: ")?;
            if password.is_empty() {
                bail!("Password required");
            }
            let response = client
                .sign_in(&SignInRequest {
                    email: email.clone(),
                    password,
                })
                .await
                .map_err(|e| explain(e, "session"))?;
            if response.requires_otp {
                eprintln!("Run `intervue verify <email> <code>` with the code from your email.");
            } else {
                remember_email(config, email);
            }
        }
        Command::Otp { email } => {
            client
                .request_otp(&OtpRequest { email })
                .await
                .map_err(|e| explain(e, "passcode"))?;
        }
        Command::Verify { email, code } => {
            client
                .verify_otp(&VerifyOtpRequest {
                    email: email.clone(),
                    otp: code,
                })
                .await
                .map_err(|e| explain(e, "session"))?;
            remember_email(config, email);
        }
        Command::Logout => client.logout(),
        Command::Me => {
            let user = require(client.current_user().await, "profile")?;
            eprintln!("Signed in as {}", user.display_name());
            print_json(&user)?;
        }
        Command::Interviews => {
            let interviews = require(client.interviews().await, "interviews")?;
            if interviews.is_empty() {
                eprintln!("No interviews yet.");
            }
            for interview in &interviews {
                println!(
                    "{}\t{}\t{} questions",
                    interview.id,
                    interview.summary(),
                    interview.question_count()
                );
            }
        }
        Command::Interview { id } => {
            let interview = require(client.interview(&id).await, "interview")?;
            print_json(&interview)?;
        }
        Command::Pay {
            plan_id,
            amount,
            currency,
        } => {
            let initiation = client
                .initiate_payment(&InitiatePaymentRequest {
                    plan_id,
                    amount,
                    currency,
                })
                .await
                .map_err(|e| explain(e, "payment"))?;
            print_json(&initiation)?;
            if let Some(ref url) = initiation.checkout_url {
                eprintln!("Complete the payment at {}", url);
            }
        }
        Command::PaymentStatus { id, wait } => {
            let state = if wait {
                client
                    .await_payment(
                        &id,
                        Duration::from_secs(PAYMENT_POLL_INTERVAL_SECS),
                        PAYMENT_MAX_POLLS,
                    )
                    .await
            } else {
                client.payment_status(&id).await
            };
            let status = require(state, "payment status")?;
            print_json(&status)?;
        }
        Command::Vapi => {
            let status = require(client.vapi_status().await, "voice assistant status")?;
            print_json(&status)?;
            if !status.connected {
                bail!("Voice assistant is not reachable");
            }
        }
    }
    Ok(())
}

fn remember_email(config: &mut Config, email: String) {
    if config.last_email.as_deref() == Some(email.as_str()) {
        return;
    }
    config.last_email = Some(email);
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

use std::sync::Arc;

use futures::{StreamExt, stream};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_stream::wrappers::BroadcastStream;

use signup_flow::config::WorkflowConfig;
use signup_flow::error::WorkflowError;
use signup_flow::form::RoleKind;
use signup_flow::services::{MockPaymentGateway, MockVerificationService};
use signup_flow::workflow::{RegistrationWorkflow, WorkflowEvent};

const HELP: &str = "\
Commands:
  set <field> <value>     fill a form field (e.g. set mobileNumber 9876543210)
  role <fresher|experienced>
  skill add <skill>       skill rm <skill>
  terms [on|off]
  submit                  validate and move to the next step
  otp <code>              verify the OTP        resend    send a new OTP
  cancel                  back to the form      pay       confirm the payment
  dismiss                 clear the error banner
  status                  print the session as JSON
  quit";

/// One line of user input.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Set { field: String, value: String },
    Role(RoleKind),
    SkillAdd(String),
    SkillRemove(String),
    Terms(bool),
    Submit,
    Otp(String),
    Resend,
    Cancel,
    Pay,
    Dismiss,
    Status,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (head, rest) = line.split_once(' ').unwrap_or((line, ""));
    let rest = rest.trim();

    let command = match head.to_ascii_lowercase().as_str() {
        "set" => {
            let (field, value) = rest.split_once(' ').unwrap_or((rest, ""));
            if field.is_empty() {
                return Err("usage: set <field> <value>".into());
            }
            Command::Set {
                field: field.to_string(),
                value: value.trim().to_string(),
            }
        }
        "role" => RoleKind::from_label(rest)
            .map(Command::Role)
            .ok_or_else(|| format!("unknown role '{rest}'"))?,
        "skill" => match rest.split_once(' ') {
            Some(("add", skill)) => Command::SkillAdd(skill.trim().to_string()),
            Some(("rm", skill)) => Command::SkillRemove(skill.trim().to_string()),
            _ => return Err("usage: skill add|rm <skill>".into()),
        },
        "terms" => match rest {
            "" | "on" | "yes" => Command::Terms(true),
            "off" | "no" => Command::Terms(false),
            other => return Err(format!("terms expects on or off, got '{other}'")),
        },
        "submit" => Command::Submit,
        "otp" => Command::Otp(rest.to_string()),
        "resend" => Command::Resend,
        "cancel" => Command::Cancel,
        "pay" => Command::Pay,
        "dismiss" => Command::Dismiss,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "/quit" => Command::Quit,
        other => return Err(format!("unknown command '{other}' (try help)")),
    };
    Ok(command)
}

fn report(error: &WorkflowError) {
    match error {
        WorkflowError::Validation(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("  ✗ {field}: {message}");
            }
        }
        other => eprintln!("  ✗ {other}"),
    }
}

/// Remote-backed commands run in the background so `cancel` stays usable.
fn spawn_request(workflow: &Arc<RegistrationWorkflow>, command: Command) {
    let workflow = Arc::clone(workflow);
    tokio::spawn(async move {
        let result = match command {
            Command::Submit => workflow.submit().await.map(|step| step.to_string()),
            Command::Otp(code) => workflow.verify(&code).await.map(|step| step.to_string()),
            Command::Resend => workflow.resend().await.map(|()| "OTP resent".to_string()),
            Command::Pay => workflow.confirm().await.map(|step| step.to_string()),
            _ => return,
        };
        match result {
            Ok(outcome) => eprintln!("  ✓ {outcome}"),
            Err(WorkflowError::Superseded) => {}
            Err(e) => report(&e),
        }
        eprint!("> ");
    });
}

/// Returns `false` once the user asked to quit.
async fn handle(workflow: &Arc<RegistrationWorkflow>, command: Command) -> bool {
    let result = match command {
        Command::Set { field, value } => workflow.update_field(&field, &value).await,
        Command::Role(role) => workflow.select_role(role).await,
        Command::SkillAdd(skill) => match workflow.add_skill(&skill).await {
            Ok(false) => {
                eprintln!("  skill not added (blank, too long, duplicate, or list full)");
                Ok(())
            }
            other => other.map(|_| ()),
        },
        Command::SkillRemove(skill) => workflow.remove_skill(&skill).await.map(|_| ()),
        Command::Terms(accepted) => workflow.set_terms_accepted(accepted).await,
        Command::Cancel => workflow.cancel().await,
        Command::Dismiss => workflow.dismiss_failure().await,
        Command::Status => {
            let view = workflow.view().await;
            match serde_json::to_string_pretty(&view) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("  ✗ {e}"),
            }
            Ok(())
        }
        Command::Help => {
            eprintln!("{HELP}");
            Ok(())
        }
        Command::Quit => return false,
        request @ (Command::Submit | Command::Otp(_) | Command::Resend | Command::Pay) => {
            spawn_request(workflow, request);
            return true;
        }
    };

    if let Err(e) = result {
        report(&e);
    }
    true
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing; RUST_LOG wins over SIGNUP_LOG
    let default_filter = std::env::var("SIGNUP_LOG").unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    run().await?;
    Ok(())
}

async fn run() -> signup_flow::error::Result<()> {
    let config = WorkflowConfig::from_env();
    let flow = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("SIGNUP_FLOW").ok())
        .unwrap_or_else(|| "employer".to_string());
    let plan = config.plan_for(&flow)?;

    let mut verifier = MockVerificationService::new(config.mock_latency);
    if let Some(code) = &config.mock_otp {
        verifier = verifier.with_fixed_code(code.clone());
    }
    let payments = MockPaymentGateway::new(config.mock_latency);

    let workflow = Arc::new(RegistrationWorkflow::new(
        plan,
        Arc::new(verifier),
        Arc::new(payments),
        &config,
    ));

    eprintln!("📝 Signup flow v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Form: {}", workflow.plan().kind());
    eprintln!("   Session: {}", workflow.id());
    eprintln!("   Type help for commands.\n");

    // Echo step changes and banners as they happen
    let mut events = BroadcastStream::new(workflow.subscribe());
    tokio::spawn(async move {
        while let Some(event) = events.next().await {
            match event {
                Ok(WorkflowEvent::StepChanged { to, .. }) => eprintln!("  → step: {to}"),
                Ok(WorkflowEvent::FailureRaised {
                    message: Some(message),
                }) => eprintln!("  ⚠ {message}"),
                Ok(_) => {}
                Err(e) => tracing::warn!("Event stream lagged: {}", e),
            }
        }
    });

    let lines = BufReader::new(tokio::io::stdin()).lines();
    let mut input = Box::pin(stream::unfold(lines, |mut lines| async move {
        match lines.next_line().await {
            Ok(Some(line)) => Some((line, lines)),
            Ok(None) => None, // EOF
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                None
            }
        }
    }));

    eprint!("> ");
    while let Some(line) = input.next().await {
        if line.trim().is_empty() {
            eprint!("> ");
            continue;
        }
        match parse_command(&line) {
            Ok(command) => {
                if !handle(&workflow, command).await {
                    break;
                }
            }
            Err(message) => eprintln!("  {message}"),
        }
        eprint!("> ");
    }

    workflow.teardown().await;
    Ok(())
}

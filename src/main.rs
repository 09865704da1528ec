use aula_access::config::cli::Command;
use aula_access::domain::model::{CourseQuery, EvaluationSubmission, RegisterRequest};
use aula_access::domain::ports::SecretStorage;
use aula_access::utils::error::ErrorSeverity;
use aula_access::utils::logger;
use aula_access::{
    AccessError, AulaClient, CliConfig, Credentials, FileSecretStorage, MemorySecretStorage,
    ResponseEnvelope, SessionContext,
};
use clap::Parser;
use serde::Serialize;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    let resolved = match cli.resolve() {
        Ok(resolved) => resolved,
        Err(e) => {
            logger::init_cli_logger(cli.verbose);
            tracing::error!("❌ Configuration validation failed: {}", e);
            exit_with(&e);
        }
    };

    if resolved.log_json {
        logger::init_json_logger(resolved.verbose);
    } else {
        logger::init_cli_logger(resolved.verbose);
    }

    tracing::info!("Starting aula-access in {} mode", resolved.client.mode);
    if resolved.verbose {
        tracing::debug!("Resolved config: {:?}", resolved);
    }

    let client = match AulaClient::new(resolved.client.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!("❌ Could not build client: {}", e);
            exit_with(&e);
        }
    };

    let storage: Box<dyn SecretStorage> = if resolved.ephemeral {
        Box::new(MemorySecretStorage::new())
    } else {
        Box::new(FileSecretStorage::new(&resolved.storage_dir))
    };
    let session = client.session(storage);

    if needs_session(&cli.command) {
        let state = session.hydrate().await;
        tracing::debug!("Session state after restore: {:?}", state);
    }

    let success = run(&client, &session, cli.command).await?;
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn needs_session(command: &Command) -> bool {
    !matches!(command, Command::Register { .. })
}

async fn run<S: SecretStorage>(
    client: &AulaClient,
    session: &SessionContext<S>,
    command: Command,
) -> Result<bool, Box<dyn std::error::Error>> {
    match command {
        Command::Login {
            identifier,
            password,
        } => print(session.login(&Credentials::new(identifier, password)).await),
        Command::Register {
            username,
            email,
            password,
        } => print(
            client
                .auth()
                .register(&RegisterRequest {
                    username,
                    email,
                    password,
                    roles: None,
                })
                .await,
        ),
        Command::Logout => print(session.logout().await),
        Command::Status => print(ResponseEnvelope::ok(session.session())),
        Command::Profile => print(client.auth().profile().await),
        Command::Courses { enrolled, limit } => {
            print(client.courses().list(CourseQuery { enrolled, limit }).await)
        }
        Command::Course { id } => print(client.courses().get_by_id(id).await),
        Command::Enroll { id } => print(client.courses().enroll(id).await),
        Command::Grades { course } => match course {
            Some(course_id) => print(client.grades().list_for_course(course_id).await),
            None => print(client.grades().list().await),
        },
        Command::Schedule { today } => {
            if today {
                print(client.schedule().today().await)
            } else {
                print(client.schedule().list().await)
            }
        }
        Command::Assignments => print(client.assignments().list().await),
        Command::SubmitAssignment { id, content } => {
            print(client.assignments().submit(id, &content).await)
        }
        Command::Announcements => print(client.communication().list_announcements().await),
        Command::ReadAnnouncement { id } => print(client.communication().mark_read(id).await),
        Command::Evaluation { id } => print(client.evaluations().get_by_id(id).await),
        Command::SubmitEvaluation { id, answers } => {
            let submission = EvaluationSubmission {
                answers: answers.into_iter().collect(),
            };
            print(client.evaluations().submit(id, &submission).await)
        }
    }
}

fn print<T: Serialize>(envelope: ResponseEnvelope<T>) -> Result<bool, Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    Ok(envelope.success)
}

fn exit_with(error: &AccessError) -> ! {
    eprintln!("❌ {}", error.user_message());
    eprintln!("💡 Sugerencia: {}", error.recovery_suggestion());

    let exit_code = match error.severity() {
        ErrorSeverity::Low | ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code)
}

use crate::config::toml_config::TomlConfig;
use crate::config::{ClientConfig, OperatingMode};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "aula-access")]
#[command(about = "Campus data access client with offline fallback")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<String>,

    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub timeout_ms: Option<u64>,

    #[arg(long, help = "Serve everything from the bundled demo dataset")]
    pub demo: bool,

    #[arg(long, help = "Surface read failures instead of serving fallback data")]
    pub no_fallback: bool,

    #[arg(long, help = "Directory holding the persisted session")]
    pub storage_dir: Option<String>,

    #[arg(long, help = "Keep the session in memory only")]
    pub ephemeral: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Log in with email or username
    Login {
        identifier: String,
        #[arg(long)]
        password: String,
    },
    /// Create a new account
    Register {
        username: String,
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    /// Restore the persisted session and print its state
    Status,
    Profile,
    Courses {
        #[arg(long)]
        enrolled: Option<bool>,
        #[arg(long)]
        limit: Option<usize>,
    },
    Course {
        id: u64,
    },
    Enroll {
        id: u64,
    },
    Grades {
        #[arg(long)]
        course: Option<u64>,
    },
    Schedule {
        #[arg(long, help = "Only today's classes")]
        today: bool,
    },
    Assignments,
    SubmitAssignment {
        id: u64,
        #[arg(long)]
        content: String,
    },
    Announcements,
    ReadAnnouncement {
        id: u64,
    },
    Evaluation {
        id: u64,
    },
    /// Answers given as question=answer pairs
    SubmitEvaluation {
        id: u64,
        #[arg(long = "answer", value_parser = parse_answer)]
        answers: Vec<(String, String)>,
    },
}

fn parse_answer(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(q, a)| (q.trim().to_string(), a.trim().to_string()))
        .filter(|(q, _)| !q.is_empty())
        .ok_or_else(|| format!("expected question=answer, got '{}'", raw))
}

/// Effective settings after layering CLI flags over the optional TOML file.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub client: ClientConfig,
    pub storage_dir: String,
    pub ephemeral: bool,
    pub verbose: bool,
    pub log_json: bool,
}

impl CliConfig {
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        let file = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        let mut client = file.client_config();
        if let Some(base_url) = &self.base_url {
            client.base_url = base_url.clone();
        }
        if let Some(timeout_ms) = self.timeout_ms {
            client.timeout_ms = timeout_ms;
        }
        if self.demo {
            client.mode = OperatingMode::Demo;
        }
        if self.no_fallback {
            client.allow_offline_fallback = false;
        }

        let resolved = ResolvedConfig {
            client,
            storage_dir: self
                .storage_dir
                .clone()
                .unwrap_or_else(|| file.storage.path.clone()),
            ephemeral: self.ephemeral || file.storage.ephemeral,
            verbose: self.verbose || file.verbose_logs(),
            log_json: self.log_json || file.json_logs(),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

impl Validate for ResolvedConfig {
    fn validate(&self) -> Result<()> {
        self.client.validate()?;
        if !self.ephemeral {
            crate::utils::validation::validate_path("storage_dir", &self.storage_dir)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::parse_from([
            "aula-access",
            "--demo",
            "--no-fallback",
            "--timeout-ms",
            "2000",
            "--ephemeral",
            "courses",
            "--limit",
            "2",
        ]);
        let resolved = cli.resolve().unwrap();

        assert_eq!(resolved.client.mode, OperatingMode::Demo);
        assert!(!resolved.client.allow_offline_fallback);
        assert_eq!(resolved.client.timeout_ms, 2000);
        assert!(resolved.ephemeral);
        assert!(matches!(
            cli.command,
            Command::Courses {
                limit: Some(2),
                enrolled: None
            }
        ));
    }

    #[test]
    fn test_answer_pairs() {
        let cli = CliConfig::parse_from([
            "aula-access",
            "submit-evaluation",
            "1",
            "--answer",
            "q1=B",
            "--answer",
            "q2 = 4",
        ]);
        match cli.command {
            Command::SubmitEvaluation { id, answers } => {
                assert_eq!(id, 1);
                assert_eq!(
                    answers,
                    vec![
                        ("q1".to_string(), "B".to_string()),
                        ("q2".to_string(), "4".to_string())
                    ]
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
        assert!(parse_answer("no-separator").is_err());
    }
}

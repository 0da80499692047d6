use relay_agent::assistant::read_assistant_file;
use relay_agent::builtin::default_registry;
use relay_core::config::{AppConfig, LoadOptions};
use serde::Serialize;

use crate::commands::{escape_json, runtime};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

const DEPENDENT_CHECKS: [&str; 3] = ["thread_log", "assistant", "tools"];

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.extend(runtime_checks(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.extend(DEPENDENT_CHECKS.into_iter().map(|name| DoctorCheck {
                name,
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            }));
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn runtime_checks(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(details) => {
            return DEPENDENT_CHECKS
                .into_iter()
                .map(|name| DoctorCheck { name, status: CheckStatus::Fail, details: details.clone() })
                .collect();
        }
    };

    runtime.block_on(async {
        let mut checks = Vec::with_capacity(DEPENDENT_CHECKS.len());

        let thread_log = match relay_db::from_config(&config.thread_log).await {
            Ok(log) => {
                let details = match log.backend_name() {
                    "memory" => "thread log disabled; threads are not persisted".to_string(),
                    backend => format!("{backend} thread log ready"),
                };
                checks.push(DoctorCheck { name: "thread_log", status: CheckStatus::Pass, details });
                Some(log)
            }
            Err(error) => {
                checks.push(DoctorCheck {
                    name: "thread_log",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                });
                None
            }
        };

        checks.push(check_assistant(config).await);

        checks.push(match thread_log {
            Some(log) => match default_registry(config, reqwest::Client::new(), log) {
                Ok(registry) => DoctorCheck {
                    name: "tools",
                    status: CheckStatus::Pass,
                    details: format!("registered: {}", registry.names().join(", ")),
                },
                Err(error) => DoctorCheck {
                    name: "tools",
                    status: CheckStatus::Fail,
                    details: error.to_string(),
                },
            },
            None => DoctorCheck {
                name: "tools",
                status: CheckStatus::Skipped,
                details: "skipped because the thread log did not initialize".to_string(),
            },
        });

        checks
    })
}

async fn check_assistant(config: &AppConfig) -> DoctorCheck {
    if let Some(id) = &config.openai.assistant_id {
        return DoctorCheck {
            name: "assistant",
            status: CheckStatus::Pass,
            details: format!("configured assistant `{id}`"),
        };
    }

    let path = &config.openai.assistant_file;
    match read_assistant_file(path).await {
        Ok(Some(id)) => DoctorCheck {
            name: "assistant",
            status: CheckStatus::Pass,
            details: format!("assistant `{id}` loaded from `{}`", path.display()),
        },
        Ok(None) => DoctorCheck {
            name: "assistant",
            status: CheckStatus::Pass,
            details: format!(
                "no assistant yet; one will be created on first server start and saved to `{}`",
                path.display()
            ),
        },
        Err(error) => {
            DoctorCheck { name: "assistant", status: CheckStatus::Fail, details: error.to_string() }
        }
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

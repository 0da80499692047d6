use crate::commands::{runtime, CommandResult};
use relay_core::config::{AppConfig, LoadOptions, ThreadLogBackend};
use relay_db::{connect_with_settings, migrations};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "migrate",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    if config.thread_log.backend != ThreadLogBackend::Sqlite {
        return CommandResult::success(
            "migrate",
            format!(
                "thread log backend `{}` keeps no local schema; nothing to migrate",
                backend_label(config.thread_log.backend)
            ),
        );
    }

    let runtime = match runtime() {
        Ok(runtime) => runtime,
        Err(message) => return CommandResult::failure("migrate", "runtime_init", message, 3),
    };

    let settings = &config.thread_log;
    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &settings.database_url,
            settings.max_connections,
            settings.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;
        pool.close().await;
        Ok::<(), (&'static str, String, u8)>(())
    });

    match result {
        Ok(()) => CommandResult::success(
            "migrate",
            format!("applied pending thread log migrations to `{}`", settings.database_url),
        ),
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("migrate", error_class, message, exit_code)
        }
    }
}

pub(crate) fn backend_label(backend: ThreadLogBackend) -> &'static str {
    match backend {
        ThreadLogBackend::Airtable => "airtable",
        ThreadLogBackend::Sqlite => "sqlite",
        ThreadLogBackend::Disabled => "disabled",
    }
}

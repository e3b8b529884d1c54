//! `kctl replace`: update objects in place, or delete and recreate them

use anyhow::{Context as AnyhowContext, Result};
use reconcile::{
    HandleDeletion, LastAppliedAnnotator, RecordFlag, ReplaceFlags, ReplaceMode, ReplacePlan,
    Replacer,
};
use std::path::Path;

use crate::Context;
use crate::cli::ReplaceArgs;
use crate::config::Config;
use crate::manifest::FileDescriptorStream;
use crate::printer::ObjectPrinter;
use crate::remote::RestClient;
use crate::ui;

pub fn run(ctx: &Context, args: ReplaceArgs) -> Result<()> {
    let config = Config::load(ctx.config_path.as_deref()).context("Failed to load config")?;
    let wait = config.wait.to_wait_config();

    let flags = ReplaceFlags {
        filenames: args.filenames,
        force: args.force,
        cascade: args.cascade,
        grace_period: args.grace_period,
        timeout: args.timeout,
    };
    let plan = ReplacePlan::from_flags(&flags, &wait)?;

    let conn = config.connection(
        args.connection.server.as_deref(),
        args.connection.namespace.as_deref(),
        args.connection.token.as_deref(),
    );
    log::info!("using {} (namespace {})", conn.server, conn.namespace);

    let client = RestClient::new(&conn.server, conn.token);
    let stream = FileDescriptorStream::new(client, conn.namespace, conn.enforce_namespace)
        .recursive(args.recursive)
        .validate(args.validate);

    let deletion = match plan.mode() {
        ReplaceMode::Force(options) => HandleDeletion::from_options(options, &wait),
        ReplaceMode::Standard => HandleDeletion::default(),
    };
    let annotator = LastAppliedAnnotator::new(args.save_config);
    let record = RecordFlag {
        record: args.record,
    };
    let mut printer = ObjectPrinter::stdout(args.output);

    let outcome = Replacer::new(&stream, &deletion, &mut printer)
        .with_annotator(&annotator)
        .with_record(&record, change_cause())
        .with_observer(Box::new(ui::SpinnerObserver::new(ctx.quiet)))
        .with_wait(wait)
        .run(&plan)?;

    if let Some(err) = outcome.first_error()
        && outcome.is_partial()
        && !ctx.quiet
    {
        ui::warn(&partial_summary(outcome.processed, outcome.failed, err));
    }
    let processed = outcome.into_result()?;
    log::debug!("{processed} resource(s) replaced");
    Ok(())
}

fn partial_summary(processed: usize, failed: usize, first_error: &reconcile::Error) -> String {
    format!(
        "{processed} of {} resource(s) replaced ({})",
        processed + failed,
        first_error.category().description().to_lowercase()
    )
}

/// The invoking command line, as stored in the change-cause annotation
fn change_cause() -> String {
    let mut args = std::env::args();
    let program = args
        .next()
        .and_then(|p| {
            Path::new(&p)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "kctl".to_string());
    std::iter::once(program)
        .chain(args)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_summary_names_failure_kind() {
        let err = reconcile::Error::Conflict {
            message: "pod \"a\" changed".into(),
        }
        .with_source("replacing", "pods.yaml");
        assert_eq!(
            partial_summary(2, 1, &err),
            "2 of 3 resource(s) replaced (object conflict)"
        );
    }

    #[test]
    fn test_change_cause_starts_with_program_name() {
        let cause = change_cause();
        let program = cause.split(' ').next().unwrap();
        assert!(!program.is_empty());
        assert!(!program.contains('/'));
    }
}

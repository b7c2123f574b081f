use super::args::WatchArgs;
use super::{for_each_group, resolve_scope, resolve_targets, CommandError, Context};
use crate::output::{Formatter, OutputMode};
use crate::tail::TailEngine;
use crate::window::{QueryWindow, TimeRange};
use std::sync::Arc;

/// Tail each target group until interrupted.
///
/// Every group gets its own engine and watermark; they share only the client
/// and the output channel.
pub async fn run(ctx: &Context, args: &WatchArgs) -> Result<(), CommandError> {
    let start = args.start.as_deref().unwrap_or(&ctx.config.tail.default_start);
    let range = TimeRange::resolve(start, None, ctx.now)?;

    let groups = match ctx.interruptible(resolve_targets(ctx, &args.target)).await {
        Err(CommandError::Interrupted) => return Ok(()),
        other => other?,
    };

    let mode = if args.raw {
        OutputMode::Raw
    } else {
        OutputMode::Pretty
    };
    let formatter = Arc::new(Formatter::new(mode, &args.output.merge(ctx.config.output)));

    let result = for_each_group(groups, |group| {
        let ctx = ctx.clone();
        let args = args.clone();
        let formatter = Arc::clone(&formatter);
        async move {
            let streams = match ctx.interruptible(resolve_scope(&ctx, &group, &args.scope)).await {
                Err(CommandError::Interrupted) => return Ok(()),
                other => other?,
            };
            let window = QueryWindow::new(group, range.start_millis())
                .with_streams(streams)
                .with_filter(args.filter.clone());

            TailEngine::new(ctx.client.clone(), window, formatter, ctx.output.clone())
                .with_poll_interval(ctx.config.tail.poll_interval)
                .run(ctx.cancel.clone())
                .await?;
            Ok(())
        }
    })
    .await;

    match result {
        Err(CommandError::Interrupted) => Ok(()),
        other => other,
    }
}

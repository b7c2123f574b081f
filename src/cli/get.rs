use super::args::GetArgs;
use super::{for_each_group, resolve_scope, resolve_targets, CommandError, Context};
use crate::output::{Formatter, OutputMode};
use crate::window::{QueryWindow, TimeRange};
use std::sync::Arc;
use tracing::debug;

/// Fetch a bounded window from each target group and print it once
pub async fn run(ctx: &Context, args: &GetArgs) -> Result<(), CommandError> {
    let start = args.start.as_deref().unwrap_or(&ctx.config.tail.default_start);
    let range = TimeRange::resolve(start, Some(&args.stop), ctx.now)?;
    if let Some(end) = range.end {
        if end < range.start {
            return Err(CommandError::InvalidArgument(format!(
                "--stop ({}) is before --start ({})",
                end.to_rfc3339(),
                range.start.to_rfc3339()
            )));
        }
    }

    let groups = ctx.interruptible(resolve_targets(ctx, &args.target)).await?;

    let mode = if args.pretty {
        OutputMode::Pretty
    } else {
        OutputMode::Raw
    };
    let formatter = Arc::new(Formatter::new(mode, &args.output.merge(ctx.config.output)));

    for_each_group(groups, |group| {
        let ctx = ctx.clone();
        let args = args.clone();
        let formatter = Arc::clone(&formatter);
        async move {
            let fetch = async {
                let streams = resolve_scope(&ctx, &group, &args.scope).await?;
                let window = QueryWindow::new(group.as_str(), range.start_millis())
                    .with_end(range.end_millis())
                    .with_streams(streams)
                    .with_filter(args.filter.clone());
                ctx.client
                    .filter_events(&window)
                    .await
                    .map_err(CommandError::from)
            };
            let events = ctx.interruptible(fetch).await?;
            debug!(group = %group, events = events.len(), "Fetched window");

            for event in &events {
                ctx.emit(formatter.format(event)).await?;
            }
            Ok(())
        }
    })
    .await
}

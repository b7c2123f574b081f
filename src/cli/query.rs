use super::args::QueryArgs;
use super::{CommandError, Context};
use crate::output::table::format_rows;
use crate::remote::InsightsQuery;
use crate::window::TimeRange;
use tracing::info;

/// Run one Insights query over every listed group and print the rows
pub async fn run(ctx: &Context, args: &QueryArgs) -> Result<(), CommandError> {
    if args.query.trim().is_empty() {
        return Err(CommandError::InvalidArgument("--query must not be empty".to_string()));
    }

    let start = args.start.as_deref().unwrap_or(&ctx.config.tail.default_start);
    let range = TimeRange::resolve(start, Some(&args.stop), ctx.now)?;
    let end = range.end.unwrap_or(ctx.now);

    let query = InsightsQuery {
        groups: args.groups.clone(),
        start: range.start.timestamp(),
        end: end.timestamp(),
        query: args.query.clone(),
    };

    info!(groups = ?query.groups, start = query.start, end = query.end, "Running query");
    let results = ctx
        .interruptible(async { ctx.client.run_query(&query).await.map_err(CommandError::from) })
        .await?;

    for line in format_rows(&results.rows, !args.no_headers) {
        ctx.emit(line).await?;
    }

    Ok(())
}

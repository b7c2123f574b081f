use super::args::StreamsArgs;
use super::{for_each_group, resolve_targets, CommandError, Context};
use crate::remote::StreamsRequest;

/// Print stream names of each target group in the requested order
pub async fn run(ctx: &Context, args: &StreamsArgs) -> Result<(), CommandError> {
    let groups = ctx.interruptible(resolve_targets(ctx, &args.target)).await?;

    let args = args.clone();
    for_each_group(groups, |group| {
        let ctx = ctx.clone();
        let request = StreamsRequest {
            group,
            prefix: args.prefix.clone(),
            order_by: args.order_by.into(),
            descending: args.descending,
        };
        async move {
            let streams = ctx
                .interruptible(async {
                    ctx.client
                        .list_streams(&request)
                        .await
                        .map_err(CommandError::from)
                })
                .await?;
            for stream in streams {
                ctx.emit(stream.name).await?;
            }
            Ok(())
        }
    })
    .await
}

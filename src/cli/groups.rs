use super::args::GroupsArgs;
use super::{CommandError, Context};

/// Print every log group name, optionally narrowed to a substring
pub async fn run(ctx: &Context, args: &GroupsArgs) -> Result<(), CommandError> {
    let groups = ctx
        .interruptible(async {
            ctx.client
                .list_groups(args.prefix.as_deref())
                .await
                .map_err(CommandError::from)
        })
        .await?;

    for group in groups {
        if let Some(needle) = &args.fuzzy {
            if !group.name.contains(needle.as_str()) {
                continue;
            }
        }
        ctx.emit(group.name).await?;
    }

    Ok(())
}

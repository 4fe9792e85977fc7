//! Interactive sessions inside the service containers

use crate::error::OpsResult;
use crate::state::OpsContext;

pub async fn shell(ctx: &OpsContext, service: Option<&str>) -> OpsResult<()> {
    let service = service.unwrap_or(&ctx.config.api_service);
    ctx.stack.exec_interactive(service, &["sh".to_string()]).await
}

pub async fn psql(ctx: &OpsContext) -> OpsResult<()> {
    let db = &ctx.config.db;
    let command = vec![
        "psql".to_string(),
        "-U".to_string(),
        db.user.clone(),
        "-d".to_string(),
        db.name.clone(),
    ];
    ctx.stack
        .exec_interactive(&ctx.config.db_service, &command)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::registry_api::test_server::unreachable;
    use crate::services::testing::test_context;

    #[tokio::test]
    async fn test_shell_defaults_to_api_service() {
        let t = test_context(&unreachable(), &[], |s, d| (s, d));
        shell(&t.ctx, None).await.unwrap();
        shell(&t.ctx, Some("postgres")).await.unwrap();
        psql(&t.ctx).await.unwrap();

        assert_eq!(
            t.calls.all(),
            vec![
                "exec registry sh",
                "exec postgres sh",
                "exec postgres psql -U registry -d registry",
            ]
        );
    }
}

//! clean / backup / restore
//!
//! clean 与 restore 是破坏性操作，必须键入 `yes` 确认；拒绝时不做任何修改并正常退出

use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};

use crate::console;
use crate::domain::backup::{
    list_backups, next_backup_path, resolve_restore_target, validate_restore_target,
};
use crate::error::{OpsError, OpsResult};
use crate::state::OpsContext;

/// 删除容器、卷和本地数据目录
///
/// 返回是否实际执行
pub async fn clean(ctx: &OpsContext) -> OpsResult<bool> {
    let data_dir = &ctx.config.data_dir;
    console::header("Clean");
    console::warn(&format!(
        "This stops all containers, deletes their volumes and removes {}",
        data_dir.display()
    ));
    if !ctx.prompter.confirm("Delete all registry data?") {
        console::info("Aborted");
        return Ok(false);
    }

    ctx.stack.down(true).await?;
    if data_dir.exists() {
        tokio::fs::remove_dir_all(data_dir).await?;
        info!(dir = %data_dir.display(), "Removed data directory");
    }
    console::success("All containers, volumes and local data removed");
    Ok(true)
}

/// 导出数据库到备份目录，返回备份文件路径
pub async fn backup(ctx: &OpsContext) -> OpsResult<PathBuf> {
    let dir = &ctx.config.backup_dir;
    tokio::fs::create_dir_all(dir).await?;

    let path = next_backup_path(dir, Local::now());
    console::info(&format!("Dumping database to {}", path.display()));
    ctx.db.dump_to(&path).await?;

    let size = tokio::fs::metadata(&path).await?.len();
    info!(path = %path.display(), size, "Backup written");
    console::success(&format!(
        "Backup written to {} ({:.1} KB)",
        path.display(),
        size as f64 / 1024.0
    ));
    Ok(path)
}

/// 从备份恢复数据库，覆盖当前数据
///
/// 未指定文件时列出可用备份并询问文件名。返回是否实际执行。
pub async fn restore(ctx: &OpsContext, file: Option<&str>) -> OpsResult<bool> {
    let dir = &ctx.config.backup_dir;
    console::header("Restore");

    let input = match file {
        Some(file) => file.to_string(),
        None => {
            let backups = list_backups(dir)?;
            if backups.is_empty() {
                console::warn(&format!("No backups found in {}", dir.display()));
            } else {
                console::info(&format!("Available backups in {}:", dir.display()));
                for b in &backups {
                    console::kv(&b.name, &format!("{:.1} KB", b.size_kb()));
                }
            }
            match ctx.prompter.ask("Backup file to restore: ") {
                Some(answer) if !answer.trim().is_empty() => answer,
                _ => {
                    console::info("Aborted");
                    return Ok(false);
                }
            }
        }
    };

    let path = resolve_restore_target(dir, &input);
    let size = validate_restore_target(&path).map_err(|e| OpsError::Backup(e.to_string()))?;

    console::warn(&format!(
        "This overwrites the live database {} with {} ({} bytes)",
        ctx.config.db.name,
        path.display(),
        size
    ));
    if !ctx.prompter.confirm("Restore this backup?") {
        console::info("Aborted");
        return Ok(false);
    }

    ctx.db.restore_from(&path).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "Restore failed");
        e
    })?;
    console::success(&format!("Database restored from {}", path.display()));
    Ok(true)
}

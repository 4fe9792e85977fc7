//! 数据库备份文件

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use thiserror::Error;

const PREFIX: &str = "backup_";
const EXTENSION: &str = "sql";

/// 备份文件信息
#[derive(Debug, Clone, PartialEq)]
pub struct BackupFile {
    pub name: String,
    pub path: PathBuf,
    pub size_bytes: u64,
}

impl BackupFile {
    pub fn size_kb(&self) -> f64 {
        self.size_bytes as f64 / 1024.0
    }
}

/// 基础文件名，如 `backup_20260118_093012.sql`
pub fn backup_file_name(at: DateTime<Local>) -> String {
    format!("{}{}.{}", PREFIX, at.format("%Y%m%d_%H%M%S"), EXTENSION)
}

/// 在目录中为新备份选择一个不存在的路径
///
/// 同一秒内多次备份时追加 `_1`、`_2` 后缀
pub fn next_backup_path(dir: &Path, at: DateTime<Local>) -> PathBuf {
    let base = backup_file_name(at);
    let candidate = dir.join(&base);
    if !candidate.exists() {
        return candidate;
    }
    let stem = base.trim_end_matches(&format!(".{}", EXTENSION)).to_string();
    (1..)
        .map(|n| dir.join(format!("{}_{}.{}", stem, n, EXTENSION)))
        .find(|p| !p.exists())
        .unwrap_or(candidate)
}

/// 是否为备份文件名
pub fn is_backup_name(name: &str) -> bool {
    name.starts_with(PREFIX) && name.ends_with(&format!(".{}", EXTENSION))
}

/// 列出目录中的备份文件，按文件名（即时间）排序
///
/// 目录不存在时返回空列表
pub fn list_backups(dir: &Path) -> std::io::Result<Vec<BackupFile>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut backups = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        let meta = entry.metadata()?;
        if meta.is_file() && is_backup_name(&name) {
            backups.push(BackupFile {
                name,
                path: entry.path(),
                size_bytes: meta.len(),
            });
        }
    }
    backups.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(backups)
}

/// 解析用户输入的恢复目标：绝对路径原样使用，否则相对备份目录
pub fn resolve_restore_target(dir: &Path, input: &str) -> PathBuf {
    let input = input.trim();
    let path = Path::new(input);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dir.join(path)
    }
}

/// 恢复目标校验错误
#[derive(Debug, PartialEq, Error)]
pub enum RestoreTargetError {
    #[error("backup file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("backup file is empty: {}", .0.display())]
    Empty(PathBuf),
}

/// 恢复前校验：文件必须存在且非空
pub fn validate_restore_target(path: &Path) -> Result<u64, RestoreTargetError> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(meta.len()),
        Ok(meta) if meta.is_file() => Err(RestoreTargetError::Empty(path.to_path_buf())),
        _ => Err(RestoreTargetError::Missing(path.to_path_buf())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 18, h, m, s).unwrap()
    }

    #[test]
    fn test_backup_file_name() {
        assert_eq!(backup_file_name(at(9, 30, 12)), "backup_20260118_093012.sql");
        assert!(is_backup_name("backup_20260118_093012.sql"));
        assert!(!is_backup_name("notes.txt"));
        assert!(!is_backup_name("backup_20260118_093012.sql.gz"));
    }

    #[test]
    fn test_next_backup_path_avoids_collisions() {
        let dir = tempfile::tempdir().unwrap();
        let first = next_backup_path(dir.path(), at(9, 30, 12));
        std::fs::write(&first, "dump").unwrap();

        let second = next_backup_path(dir.path(), at(9, 30, 12));
        assert_ne!(first, second);
        assert_eq!(
            second.file_name().unwrap().to_string_lossy(),
            "backup_20260118_093012_1.sql"
        );
    }

    #[test]
    fn test_list_backups_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("backup_20260118_100000.sql"), "b").unwrap();
        std::fs::write(dir.path().join("backup_20260117_100000.sql"), "aa").unwrap();
        std::fs::write(dir.path().join("README"), "x").unwrap();

        let backups = list_backups(dir.path()).unwrap();
        let names: Vec<&str> = backups.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["backup_20260117_100000.sql", "backup_20260118_100000.sql"]
        );
        assert_eq!(backups[0].size_bytes, 2);
    }

    #[test]
    fn test_list_backups_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_backups(&dir.path().join("nope")).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_and_validate_restore_target() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("backup_1.sql");
        let empty = dir.path().join("backup_2.sql");
        std::fs::write(&good, "CREATE TABLE t();").unwrap();
        std::fs::write(&empty, "").unwrap();

        assert_eq!(resolve_restore_target(dir.path(), " backup_1.sql\n"), good);
        assert_eq!(resolve_restore_target(dir.path(), good.to_str().unwrap()), good);

        assert!(validate_restore_target(&good).is_ok());
        assert_eq!(
            validate_restore_target(&empty),
            Err(RestoreTargetError::Empty(empty.clone()))
        );
        let missing = dir.path().join("missing.sql");
        assert_eq!(
            validate_restore_target(&missing),
            Err(RestoreTargetError::Missing(missing.clone()))
        );
    }

    #[test]
    fn test_restore_target_error_messages() {
        let missing = RestoreTargetError::Missing(PathBuf::from("/srv/registry/backups/x.sql"));
        assert_eq!(missing.to_string(), "backup file not found: /srv/registry/backups/x.sql");

        let empty: Box<dyn std::error::Error> =
            Box::new(RestoreTargetError::Empty(PathBuf::from("backup_2.sql")));
        assert_eq!(empty.to_string(), "backup file is empty: backup_2.sql");
    }
}

//! 数据库相关领域模型

/// 按状态分组的记录数
#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// 分组统计 SQL
pub fn status_count_sql(table: &str, column: &str) -> String {
    format!(
        "SELECT {col}, COUNT(*) FROM {table} GROUP BY {col} ORDER BY {col};",
        col = column,
        table = table
    )
}

/// 解析 `psql -At -F '|'` 输出
///
/// NULL 状态输出为空字符串，显示为 `(null)`
pub fn parse_status_counts(output: &str) -> Vec<StatusCount> {
    output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let (status, count) = line.rsplit_once('|')?;
            let count = count.trim().parse::<i64>().ok()?;
            let status = status.trim();
            Some(StatusCount {
                status: if status.is_empty() {
                    "(null)".to_string()
                } else {
                    status.to_string()
                },
                count,
            })
        })
        .collect()
}

/// 恢复前清空 public schema 的 SQL
pub const RESET_SCHEMA_SQL: &str = "DROP SCHEMA public CASCADE; CREATE SCHEMA public;";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_count_sql() {
        assert_eq!(
            status_count_sql("servers", "status"),
            "SELECT status, COUNT(*) FROM servers GROUP BY status ORDER BY status;"
        );
    }

    #[test]
    fn test_parse_status_counts() {
        let counts = parse_status_counts("active|12\ndeprecated|3\n|1\n\nbroken line\n");
        assert_eq!(
            counts,
            vec![
                StatusCount { status: "active".into(), count: 12 },
                StatusCount { status: "deprecated".into(), count: 3 },
                StatusCount { status: "(null)".into(), count: 1 },
            ]
        );
    }
}

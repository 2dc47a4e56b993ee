use crate::{
    models::SqlDocument,
    query::{Collection, Direction, Filter, Query, QueryResult},
    Db, DocumentStore,
};
use anyhow::bail;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{QueryBuilder, Sqlite};
use tracing::debug;

fn json_path(field: &str) -> anyhow::Result<String> {
    // 字段名会拼进 SQL，只允许标识符字符
    if field.is_empty() || !field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid field name: {:?}", field);
    }
    Ok(format!("json_extract(body, '$.{}')", field))
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) -> anyhow::Result<()> {
    match value {
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        Value::Bool(b) => {
            qb.push_bind(*b);
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                qb.push_bind(i);
            } else if let Some(f) = n.as_f64() {
                qb.push_bind(f);
            } else {
                bail!("unsupported number: {}", n);
            }
        }
        Value::Null => {
            qb.push("NULL");
        }
        other => bail!("unsupported filter value: {}", other),
    }
    Ok(())
}

fn push_filter(qb: &mut QueryBuilder<'_, Sqlite>, filter: &Filter) -> anyhow::Result<()> {
    match filter {
        Filter::Eq(field, v) => {
            qb.push(json_path(field)?).push(" = ");
            push_value(qb, v)?;
        }
        Filter::Ne(field, v) => {
            // IS NOT 让缺失字段 (NULL) 也算作“不等于”
            qb.push(json_path(field)?).push(" IS NOT ");
            push_value(qb, v)?;
        }
        Filter::Ge(field, v) => {
            qb.push(json_path(field)?).push(" >= ");
            push_value(qb, v)?;
        }
        Filter::In(field, values) => {
            if values.is_empty() {
                qb.push("0");
                return Ok(());
            }
            qb.push(json_path(field)?).push(" IN (");
            for (i, v) in values.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_value(qb, v)?;
            }
            qb.push(")");
        }
        Filter::And(filters) | Filter::Or(filters) => {
            let is_and = matches!(filter, Filter::And(_));
            if filters.is_empty() {
                qb.push(if is_and { "1" } else { "0" });
                return Ok(());
            }
            let joiner = if is_and { " AND " } else { " OR " };
            qb.push("(");
            for (i, f) in filters.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_filter(qb, f)?;
            }
            qb.push(")");
        }
    }
    Ok(())
}

fn scoped<'a>(select: &str, collection: Collection, query: &Query) -> anyhow::Result<QueryBuilder<'a, Sqlite>> {
    let mut qb = QueryBuilder::new(select);
    qb.push(" FROM documents WHERE collection = ");
    qb.push_bind(collection.name());
    if let Some(filter) = &query.filter {
        qb.push(" AND ");
        push_filter(&mut qb, filter)?;
    }
    Ok(qb)
}

impl Db {
    async fn select(&self, collection: Collection, query: &Query) -> anyhow::Result<QueryResult> {
        let mut qb = scoped("SELECT id, body", collection, query)?;

        if !query.sorts.is_empty() {
            qb.push(" ORDER BY ");
            for (i, sort) in query.sorts.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                qb.push(json_path(&sort.field)?);
                qb.push(match sort.direction {
                    Direction::Ascending => " ASC",
                    Direction::Descending => " DESC",
                });
            }
        }

        if let Some(size) = query.page_size {
            qb.push(" LIMIT ")
                .push_bind(i64::try_from(size).unwrap_or(i64::MAX))
                .push(" OFFSET ")
                .push_bind(i64::try_from(query.offset()).unwrap_or(i64::MAX));
        }

        debug!("{} query: {}", collection.name(), qb.sql());
        let rows = qb
            .build_query_as::<SqlDocument>()
            .fetch_all(&self.pool)
            .await?;

        let mut count_qb = scoped("SELECT COUNT(*)", collection, query)?;
        let record_count: i64 = count_qb.build_query_scalar().fetch_one(&self.pool).await?;
        let record_count = record_count.max(0) as usize;

        let results = rows
            .into_iter()
            .map(|row| Value::try_from(row).map(|doc| query.apply_projection(doc)))
            .collect::<anyhow::Result<Vec<_>>>()?;

        Ok(QueryResult {
            results,
            page_count: query.page_count(record_count),
            record_count,
        })
    }
}

#[async_trait]
impl DocumentStore for Db {
    async fn query(&self, collection: Collection, query: &Query) -> anyhow::Result<QueryResult> {
        self.select(collection, query).await
    }

    async fn get(&self, collection: Collection, id: &str) -> anyhow::Result<Option<Value>> {
        let row = sqlx::query_as::<_, SqlDocument>(
            "SELECT id, body FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection.name())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Value::try_from).transpose()
    }

    async fn random(&self, collection: Collection, n: usize) -> anyhow::Result<Vec<Value>> {
        let rows = sqlx::query_as::<_, SqlDocument>(
            "SELECT id, body FROM documents WHERE collection = ? ORDER BY RANDOM() LIMIT ?",
        )
        .bind(collection.name())
        .bind(n as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Value::try_from).collect()
    }

    async fn put(&self, collection: Collection, doc: Value) -> anyhow::Result<()> {
        let id = crate::document_id(&doc)?;

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, body)
            VALUES (?, ?, ?)
            ON CONFLICT(collection, id) DO UPDATE SET
                body = excluded.body
            "#,
        )
        .bind(collection.name())
        .bind(id)
        .bind(doc.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

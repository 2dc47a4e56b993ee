use serde_json::Value;
use sqlx::FromRow;

#[derive(FromRow)]
pub struct SqlDocument {
    pub id: String,
    pub body: String,
}

impl TryFrom<SqlDocument> for Value {
    type Error = anyhow::Error;

    fn try_from(row: SqlDocument) -> Result<Self, Self::Error> {
        serde_json::from_str(&row.body)
            .map_err(|e| anyhow::anyhow!("corrupt document {}: {}", row.id, e))
    }
}

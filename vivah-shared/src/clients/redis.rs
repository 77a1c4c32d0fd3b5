use redis::aio::ConnectionManager;

/// Deletes KEYS[1] only while it still holds ARGV[1].
const RELEASE_IF_OWNER: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

#[derive(Clone)]
pub struct RedisClient {
    conn: ConnectionManager,
}

impl RedisClient {
    pub async fn connect(url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        tracing::info!(url = %url, "connected to Redis");
        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }

    /// `SET key value NX EX ttl`. Returns whether the key was set.
    pub async fn set_nx(&self, key: &str, value: &str, ttl_secs: u64) -> Result<bool, redis::RedisError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl_secs)
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    /// Compare-and-delete. Returns whether the key was removed.
    pub async fn del_if_eq(&self, key: &str, value: &str) -> Result<bool, redis::RedisError> {
        let mut conn = self.conn.clone();
        let removed: i64 = redis::Script::new(RELEASE_IF_OWNER)
            .key(key)
            .arg(value)
            .invoke_async(&mut conn)
            .await?;
        Ok(removed == 1)
    }
}

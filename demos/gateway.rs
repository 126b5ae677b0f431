//! Example running the gateway schema against a seeded in-memory store

use batchql::prelude::*;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let store = Arc::new(InMemoryStore::new());
    seed(&store)?;

    let executor = Executor::new(
        gateway_schema(),
        EngineConfig::default(),
        GatewayContext::factory(store.clone()),
    );

    // One bulk fetch per association, however many users there are.
    let response = executor
        .run_query(
            "{ users { name balance profile { yearOfBirth memberType { discount } } posts { title } } }",
            None,
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&response)?);

    // Nesting past the configured bound is rejected before execution.
    let rejected = executor
        .run_query(
            "{ users { posts { author { posts { author { posts { title } } } } } } }",
            None,
        )
        .await;
    println!("{}", serde_json::to_string_pretty(&rejected)?);

    Ok(())
}

fn seed(store: &InMemoryStore) -> Result<()> {
    let alice = Uuid::new_v4().to_string();
    let bob = Uuid::new_v4().to_string();

    store.seed(
        "member_type",
        vec![
            json!({"id": "BASIC", "discount": 2.5, "postsLimitPerMonth": 10}),
            json!({"id": "BUSINESS", "discount": 7.5, "postsLimitPerMonth": 100}),
        ],
    )?;
    store.seed(
        "user",
        vec![
            json!({"id": alice, "name": "Alice", "balance": 120.0}),
            json!({"id": bob, "name": "Bob", "balance": 80.0}),
        ],
    )?;
    store.seed(
        "profile",
        vec![json!({
            "id": Uuid::new_v4().to_string(),
            "isMale": false,
            "yearOfBirth": 1992,
            "userId": alice,
            "memberTypeId": "BUSINESS",
        })],
    )?;
    store.seed(
        "post",
        vec![
            json!({"id": Uuid::new_v4().to_string(), "title": "Hello", "content": "First!", "authorId": alice}),
            json!({"id": Uuid::new_v4().to_string(), "title": "Re: Hello", "content": "Hi back", "authorId": bob}),
        ],
    )?;
    store.seed(
        "subscription",
        vec![json!({
            "id": Uuid::new_v4().to_string(),
            "subscriberId": bob,
            "authorId": alice,
        })],
    )?;
    Ok(())
}

//! Serves the view of a user profile for whichever role asks for it.
//!
//! ```sh
//! RUST_LOG=veil_model=debug cargo run -p veil-model --example user_profile
//! curl -H 'x-veil-role: User' 'http://127.0.0.1:3000/?userId=123'
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use veil_model::{MemorySource, ModelSettings, server};
use veil_tree::{Describe, PermissionsTree, Schema};

#[derive(Serialize, Deserialize)]
struct Address {
    street: String,
    city: String,
    state: String,
}

#[derive(Serialize, Deserialize)]
struct Document {
    name: String,
    url: String,
    valid: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserProfile {
    id: String,
    first_name: String,
    last_name: String,
    age: u32,
    address: Address,
    documents: Vec<Document>,
}

impl Describe for UserProfile {
    fn schema() -> Schema {
        Schema::object([
            ("id", Schema::Leaf),
            ("firstName", Schema::Leaf),
            ("lastName", Schema::Leaf),
            ("age", Schema::Leaf),
            (
                "address",
                Schema::object([
                    ("street", Schema::Leaf),
                    ("city", Schema::Leaf),
                    ("state", Schema::Leaf),
                ]),
            ),
            ("documents", Schema::Array),
        ])
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
struct UserLookup {
    user_id: String,
}

fn bingus() -> UserProfile {
    let document = |n: u32| Document {
        name: format!("Document {n}"),
        url: format!("/url/document_{n}"),
        valid: true,
    };

    UserProfile {
        id: "123".into(),
        first_name: "Bingus".into(),
        last_name: "Bonk".into(),
        age: 21,
        address: Address {
            street: "123 Bingus Street".into(),
            city: "Lingus".into(),
            state: "Ohio".into(),
        },
        documents: (1..=3).map(document).collect(),
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let everyone = json!({ "Admin": "CRUD", "User": "R" });
    let defaults = PermissionsTree::from_config(
        &UserProfile::schema(),
        &json!({
            "id": everyone,
            "firstName": everyone,
            "lastName": everyone,
            "age": everyone,
            "address": { "street": everyone, "city": everyone, "state": everyone },
            "documents": { "Admin": "CRUD", "User": "" },
        }),
    )?;

    let source: MemorySource<UserProfile, UserLookup> = MemorySource::new(&bingus())?;
    let app = server::router(source, ModelSettings::new(defaults));

    let addr = std::env::var("VEIL_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Serving user profiles on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}

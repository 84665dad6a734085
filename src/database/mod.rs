use mongodb::bson::{doc, Document};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, Database};

use crate::utils::error::AppError;

mod store;

pub const PARTICIPANTS: &str = "participants";
pub const MEETINGS: &str = "meetings";
pub const COUNTERS: &str = "counters";

const DEFAULT_DATABASE: &str = "enroller";

#[derive(Clone)]
pub struct MongoDB {
    client: Client,
    db: Database,
    transactions: bool,
}

impl MongoDB {
    pub async fn new(uri: &str) -> Result<Self, AppError> {
        let client_options = ClientOptions::parse(uri).await?;
        Self::connect(client_options).await
    }

    async fn connect(mut client_options: ClientOptions) -> Result<Self, AppError> {
        // Connection pool
        client_options.max_pool_size = Some(20);
        client_options.min_pool_size = Some(5);
        client_options.max_idle_time = Some(std::time::Duration::from_secs(300));

        client_options.connect_timeout = Some(std::time::Duration::from_secs(5));
        client_options.server_selection_timeout = Some(std::time::Duration::from_secs(5));

        let db_name = database_name(&client_options).to_string();
        let client = Client::with_options(client_options)?;
        let db = client.database(&db_name);

        // Test connection
        db.list_collection_names().await?;

        let transactions = topology_supports_transactions(&db.run_command(doc! { "hello": 1 }).await?);
        if transactions {
            log::info!("✅ Transactions available (replica set / sharded cluster)");
        } else {
            log::warn!("⚠️ Standalone MongoDB: participant deletes run without a transaction");
        }

        let mongodb = Self { client, db, transactions };
        mongodb.ensure_indexes().await?;

        Ok(mongodb)
    }

    /// Creates the indexes backing the meeting filters.
    ///
    /// (title, date) is not unique: the duplicate check on create is a
    /// guard in the request path, not a storage constraint.
    async fn ensure_indexes(&self) -> Result<(), AppError> {
        use mongodb::IndexModel;

        log::info!("🔧 Creating database indexes...");

        let meetings = self.collection::<Document>(MEETINGS);

        let title_date_index = IndexModel::builder()
            .keys(doc! { "title": 1, "date": 1 })
            .build();

        match meetings.create_index(title_date_index).await {
            Ok(_) => log::info!("   ✅ Index created: meetings(title, date)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        let participants_index = IndexModel::builder()
            .keys(doc! { "participants": 1 })
            .build();

        match meetings.create_index(participants_index).await {
            Ok(_) => log::info!("   ✅ Index created: meetings(participants)"),
            Err(e) => log::debug!("   ℹ️  Index already exists: {}", e),
        }

        log::info!("✅ Database indexes ready");

        Ok(())
    }

    pub fn collection<T: Send + Sync>(&self, name: &str) -> Collection<T> {
        self.db.collection(name)
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Multi-document transactions need a replica set or a mongos.
    pub fn supports_transactions(&self) -> bool {
        self.transactions
    }
}

/// Database named in the URI path, e.g. `mongodb://host:27017/enroller?retryWrites=true`.
fn database_name(options: &ClientOptions) -> &str {
    options.default_database.as_deref().unwrap_or(DEFAULT_DATABASE)
}

/// Reads the `hello` reply: replica set members report `setName`, mongos
/// reports `msg: "isdbgrid"`.
fn topology_supports_transactions(hello: &Document) -> bool {
    hello.contains_key("setName") || hello.get_str("msg").map_or(false, |msg| msg == "isdbgrid")
}

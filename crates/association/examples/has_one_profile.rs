//! Has-One Association Demo
//!
//! Walks a `User has_one Profile` association through lazy loading, cache
//! hits, a forced reload and a failed `create_or_fail`. Run with
//! `RUST_LOG=elif_association=debug` to see every fetch.

use elif_association::{
    error::{ModelError, ModelResult},
    model::Model,
    relationships::{
        global_registry, AssociationContext, AssociationDefinition, AssociationScope, Attributes,
        BuildOptions, FetchOutcome, RecordBuilder, RecordStore, ScopeExecutor, SingularAssociation,
    },
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone)]
struct User {
    id: Option<i64>,
    name: String,
}

#[derive(Debug, Clone)]
struct Profile {
    id: Option<i64>,
    user_id: Option<i64>,
    bio: String,
}

impl Model for User {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "users"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }

    fn set_primary_key(&mut self, key: Self::PrimaryKey) {
        self.id = Some(key);
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        HashMap::from([
            ("id".to_string(), json!(self.id)),
            ("name".to_string(), json!(self.name)),
        ])
    }
}

impl Model for Profile {
    type PrimaryKey = i64;

    fn table_name() -> &'static str {
        "profiles"
    }

    fn primary_key(&self) -> Option<Self::PrimaryKey> {
        self.id
    }

    fn set_primary_key(&mut self, key: Self::PrimaryKey) {
        self.id = Some(key);
    }

    fn to_fields(&self) -> HashMap<String, Value> {
        HashMap::from([
            ("id".to_string(), json!(self.id)),
            ("user_id".to_string(), json!(self.user_id)),
            ("bio".to_string(), json!(self.bio)),
        ])
    }

    fn set_field(&mut self, name: &str, value: Value) -> ModelResult<()> {
        match name {
            "user_id" => self.user_id = value.as_i64(),
            "bio" => self.bio = value.as_str().unwrap_or_default().to_string(),
            _ => return Err(ModelError::Validation(format!("profiles.{} is unknown", name))),
        }
        Ok(())
    }

    fn validation_errors(&self) -> Vec<String> {
        if self.bio.is_empty() {
            vec!["bio can't be blank".to_string()]
        } else {
            Vec::new()
        }
    }
}

#[derive(Default)]
struct ProfileTable {
    rows: Mutex<Vec<Profile>>,
}

#[async_trait]
impl ScopeExecutor<Profile> for ProfileTable {
    async fn first(&self, scope: &AssociationScope) -> ModelResult<FetchOutcome<Profile>> {
        let (sql, bindings) = scope.to_sql();
        println!("   SQL: {} {:?}", sql, bindings);

        let rows = self.rows.lock().map_err(|e| ModelError::Database(e.to_string()))?;
        Ok(rows.iter().find(|row| scope.matches(&row.to_fields())).cloned().into())
    }
}

#[async_trait]
impl RecordStore<User, Profile> for ProfileTable {
    async fn save(&self, record: &mut Profile) -> ModelResult<bool> {
        if !record.validation_errors().is_empty() {
            return Ok(false);
        }
        let mut rows = self.rows.lock().map_err(|e| ModelError::Database(e.to_string()))?;
        record.set_primary_key(rows.len() as i64 + 1);
        rows.push(record.clone());
        Ok(true)
    }

    fn establish_inverse(&self, _record: &mut Profile, owner: &User, definition: &AssociationDefinition) {
        tracing::info!(owner = %owner.name, inverse = ?definition.inverse, "inverse established");
    }
}

impl RecordBuilder<User, Profile> for ProfileTable {
    fn build(
        &self,
        _definition: &AssociationDefinition,
        _owner: &User,
        attributes: &Attributes,
        _options: &BuildOptions,
    ) -> ModelResult<Profile> {
        let mut profile = Profile { id: None, user_id: None, bio: String::new() };
        for (name, value) in attributes {
            profile.set_field(name, value.clone())?;
        }
        Ok(profile)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("🚀 Singular Association Demo");

    let definition = global_registry().register(
        "User",
        AssociationDefinition::has_one("profile", "profiles", "Profile", "user_id").with_inverse("user"),
    )?;

    let table = Arc::new(ProfileTable::default());
    table.rows.lock().map_err(|e| e.to_string())?.push(Profile {
        id: Some(1),
        user_id: Some(1),
        bio: "Systems programmer".to_string(),
    });

    let context = AssociationContext::new(
        table.clone() as Arc<dyn ScopeExecutor<Profile>>,
        table.clone() as Arc<dyn RecordStore<User, Profile>>,
        table.clone() as Arc<dyn RecordBuilder<User, Profile>>,
    );

    let mut ferris = User { id: Some(1), name: "ferris".to_string() };
    let mut profile = SingularAssociation::new(definition.clone(), context.clone());

    println!("\n📥 First read (fetches):");
    println!("   {:?}", profile.reader(&ferris, false).await?);

    println!("\n💾 Second read (cached):");
    println!("   {:?}", profile.reader(&ferris, false).await?);

    println!("\n🔄 Forced reload:");
    println!("   {:?}", profile.reader(&ferris, true).await?);

    println!("\n❌ create_or_fail with a blank bio:");
    let mut ada = User { id: Some(2), name: "ada".to_string() };
    let mut ada_profile = SingularAssociation::new(definition, context);
    match ada_profile.create_or_fail(&mut ada, Attributes::new(), BuildOptions::default()).await {
        Ok(created) => println!("   created {:?}", created),
        Err(err) => println!("   {}", err),
    }
    println!("   cached anyway: {:?}", ada_profile.reader(&ada, false).await?);

    println!("\n✏️  Replacing ferris' profile:");
    let fresh = profile
        .build(&mut ferris, HashMap::from([("bio".to_string(), json!("Crab"))]), BuildOptions::default())?
        .clone();
    println!("   built {:?}", fresh);

    Ok(())
}

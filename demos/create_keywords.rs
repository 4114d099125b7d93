use std::io;

use sklik::{ClientConfig, Credentials, Field, Keyword, KeywordsFilter};
use tracing_subscriber::EnvFilter;

fn required(name: &str) -> Result<String, io::Error> {
    std::env::var(name).map_err(|_| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{name} environment variable is required"),
        )
    })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sklik=debug")),
        )
        .init();

    let credentials = Credentials::from_env()?;
    let group_id: i64 = required("SKLIK_GROUP_ID")?.trim().parse()?;
    let names = required("SKLIK_KEYWORDS")?;

    let keywords = names
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| Keyword {
            group_id: Field::Present(group_id),
            name: name.into(),
            match_type: "broad".into(),
            ..Keyword::default()
        })
        .collect::<Vec<_>>();

    let mut client = ClientConfig::from_env()?
        .into_builder()
        .connect(credentials)
        .await?;

    let ids = client.create_keywords(&keywords).await?;
    println!("created keyword ids: {ids:?}");

    let listed = client
        .list_keywords(&KeywordsFilter::for_groups([group_id]))
        .await?;
    println!("group {group_id} now has {} keywords", listed.len());

    client.close().await?;
    Ok(())
}

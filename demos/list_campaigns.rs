use sklik::{CampaignsFilter, ClientConfig, Credentials, GroupsFilter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sklik=info")),
        )
        .init();

    let credentials = Credentials::from_env()?;
    let mut client = ClientConfig::from_env()?
        .into_builder()
        .connect(credentials)
        .await?;

    let campaigns = client.list_campaigns(&CampaignsFilter::default()).await?;
    for campaign in &campaigns {
        println!(
            "campaign {:?}: {:?} (status {:?}, day budget {:?})",
            campaign.id, campaign.name, campaign.status, campaign.day_budget
        );
        if let Some(&id) = campaign.id.as_ref() {
            let filter = GroupsFilter {
                campaign_ids: vec![id],
                include_deleted: false,
            };
            for group in client.list_groups(&filter).await? {
                println!("  group {:?}: {:?}", group.id, group.name);
            }
        }
    }

    client.close().await?;
    Ok(())
}

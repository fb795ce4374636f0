use std::path::Path;

use anyhow::Context;
use clap::Parser;
use dotenvy::dotenv;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use sweepr_cli::{
    Command, Config, ListingAction, OutputFormat, SweepstakeAction, TestimonialAction,
};
use sweepr_client::StorageClient;
use sweepr_core::{
    dashboard_stats, load_site_config, region_name, AdminService, AppError, ContentTable,
    DbConfig, Direction, HomePage, Listing, ListingKind, ListingStore, ObjectStore, ReorderOutcome,
    UploadConfig, GEO_HEADER,
};
use sweepr_db::{SweepstakeRepository, TestimonialRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for JSON output)
    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    if let Err(e) = run(config).await {
        match e.downcast_ref::<AppError>() {
            Some(app_error) => {
                error!("{}", e);
                eprintln!("\n❌ {}\n", app_error.user_message());
            }
            None => eprintln!("\n❌ {:#}\n", e),
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(config: Config) -> anyhow::Result<()> {
    let Config {
        database_url,
        storage_url,
        storage_key,
        config: config_path,
        command,
        ..
    } = config;
    let site = load_site_config(config_path.as_deref())?;
    let database_url = database_url.as_deref();

    match command {
        Command::Sweepstakes { action } => {
            let pool = connect(database_url).await?;
            let service =
                AdminService::with_config(SweepstakeRepository::new(pool), site.write_config());
            match action {
                SweepstakeAction::Add(fields) => {
                    let created = service.create(&fields.into()).await?;
                    println!("\n✓ Added sweepstake {} ({})\n", created.name, created.id);
                }
                SweepstakeAction::Edit { id, fields } => {
                    let updated = service.edit(id, &fields.into()).await?;
                    println!("\n✓ Updated sweepstake {} ({})\n", updated.name, updated.id);
                }
                SweepstakeAction::Common(action) => run_listing_action(&service, action).await?,
            }
        }
        Command::Testimonials { action } => {
            let pool = connect(database_url).await?;
            let service =
                AdminService::with_config(TestimonialRepository::new(pool), site.write_config());
            match action {
                TestimonialAction::Add(fields) => {
                    let created = service.create(&fields.into()).await?;
                    println!("\n✓ Added testimonial from {} ({})\n", created.name, created.id);
                }
                TestimonialAction::Edit { id, fields } => {
                    let updated = service.edit(id, &fields.into()).await?;
                    println!("\n✓ Updated testimonial from {} ({})\n", updated.name, updated.id);
                }
                TestimonialAction::Common(action) => run_listing_action(&service, action).await?,
            }
        }
        Command::Home {
            country,
            region,
            format,
        } => {
            let pool = connect(database_url).await?;
            let content = site.content_table()?;
            let region = match region {
                Some(region) => region,
                None => content.resolve_country(country.as_deref()).to_string(),
            };
            show_home(&pool, &content, &region, format).await?;
        }
        Command::Geo { code } => {
            show_geo(&site.content_table()?, code.as_deref());
        }
        Command::Upload {
            file,
            kind,
            content_type,
        } => {
            let uploads = UploadConfig::default();
            let storage = storage_client(storage_url.as_deref(), storage_key.as_deref())?
                .with_max_bytes(uploads.max_bytes);
            upload(&storage, &uploads, &file, kind.into(), content_type.as_deref()).await?;
        }
        Command::Stats => {
            let pool = connect(database_url).await?;
            show_stats(&pool).await?;
        }
    }

    Ok(())
}

async fn connect(database_url: Option<&str>) -> anyhow::Result<PgPool> {
    let database_url = database_url.context("DATABASE_URL is not set (use --database-url)")?;

    info!("Connecting to database...");
    let pool = PgPoolOptions::new()
        .max_connections(DbConfig::default().max_connections)
        .connect(database_url)
        .await
        .context("Failed to connect to database")?;
    Ok(pool)
}

fn storage_client(url: Option<&str>, key: Option<&str>) -> anyhow::Result<StorageClient> {
    let url = url.context("SWEEPR_STORAGE_URL is not set (use --storage-url)")?;
    let key = key.context("SWEEPR_STORAGE_KEY is not set (use --storage-key)")?;
    Ok(StorageClient::new(url, key)?)
}

/// List, delete, move and toggle, shared by both listing kinds
async fn run_listing_action<T, S>(
    service: &AdminService<T, S>,
    action: ListingAction,
) -> anyhow::Result<()>
where
    T: Listing,
    S: ListingStore<T>,
{
    let kind = T::KIND;
    match action {
        ListingAction::List => {
            let items = service.list().await?;
            print_listings(&items, kind);
        }
        ListingAction::Delete { id } => {
            let outcome = service.delete(id).await?;
            println!("\n✓ Deleted {} {}", kind.singular(), id);
            if let ReorderOutcome::Resynced { error, .. } = &outcome {
                println!(
                    "⚠️  Remaining positions were not renumbered ({}). The next move fixes them.",
                    error.user_message()
                );
            }
            print_listings(outcome.items(), kind);
        }
        ListingAction::Move { id, direction } => {
            let direction = Direction::from(direction);
            let outcome = service.reorder(id, direction).await?;
            match &outcome {
                ReorderOutcome::Applied(reordered) => {
                    println!(
                        "\n✓ Moved {} {} ({} rows renumbered)",
                        kind.singular(),
                        direction,
                        reordered.updates.len()
                    );
                }
                ReorderOutcome::Unchanged(_) => {
                    println!(
                        "\nℹ️  {} is already at the {}",
                        kind.singular(),
                        boundary_label(direction)
                    );
                }
                ReorderOutcome::Resynced { .. } => {
                    println!("\n⚠️  The new order was not saved. Current order:");
                }
            }
            print_listings(outcome.items(), kind);
            outcome.into_result()?;
        }
        ListingAction::Toggle { id } => {
            let updated = service.toggle_active(id).await?;
            let state = if updated.is_active() { "active" } else { "inactive" };
            println!("\n✓ {} is now {}\n", updated.title(), state);
        }
    }
    Ok(())
}

fn boundary_label(direction: Direction) -> &'static str {
    match direction {
        Direction::Up => "top",
        Direction::Down => "bottom",
    }
}

fn print_listings<T: Listing>(items: &[T], kind: ListingKind) {
    if items.is_empty() {
        println!("\nNo {} yet.\n", kind);
        return;
    }

    println!("\n📋 {} ({})\n", capitalize(kind.table()), items.len());
    for item in items {
        let marker = if item.is_active() { "●" } else { "○" };
        let countries = if item.countries().is_empty() {
            "-".to_string()
        } else {
            item.countries().join(",")
        };
        println!(
            "  {:>3}. {} {:<40} [{}]  {}",
            item.sort_order(),
            marker,
            truncate_text(item.title(), 40),
            countries,
            item.id()
        );
    }
    println!();
}

/// Render the region-specific home page
async fn show_home(
    pool: &PgPool,
    content: &ContentTable,
    region: &str,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let sweepstakes = SweepstakeRepository::new(pool.clone());
    let testimonials = TestimonialRepository::new(pool.clone());

    let (sweepstakes, testimonials) =
        futures::try_join!(sweepstakes.list(false), testimonials.list(false))?;

    let page = HomePage::build(region, content, &sweepstakes, &testimonials);
    info!(
        "Home page for {}: {} sweepstakes, {} testimonials",
        page.region,
        page.sweepstakes.len(),
        page.testimonials.len()
    );

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&page)?);
        }
        OutputFormat::Text => print_home(&page),
    }
    Ok(())
}

fn print_home(page: &HomePage) {
    let name = region_name(&page.region).unwrap_or(page.region.as_str());
    println!("\n🌏 Region: {} ({})\n", page.region, name);
    println!("  {}", page.content.hero_heading);
    println!("  {}\n", truncate_text(&page.content.hero_paragraph, 100));

    if page.is_empty() {
        println!("  No active listings for this region.\n");
        return;
    }

    println!("🎁 Sweepstakes\n");
    for (i, sweepstake) in page.sweepstakes.iter().enumerate() {
        println!("  {}. {}", i + 1, sweepstake.name);
        if let Some(url) = &sweepstake.url {
            println!("     🔗 {}", url);
        }
    }

    println!("\n💬 {}\n", page.content.testimonial_subheading);
    for testimonial in &page.testimonials {
        println!(
            "  {} \"{}\"",
            "★".repeat(testimonial.rating.clamp(0, 5) as usize),
            truncate_text(&testimonial.quote, 80)
        );
        if testimonial.location.is_empty() {
            println!("     - {}", testimonial.name);
        } else {
            println!("     - {}, {}", testimonial.name, testimonial.location);
        }
    }

    println!("\n  {}\n", page.content.footer_tagline);
}

fn show_geo(content: &ContentTable, code: Option<&str>) {
    let region = content.resolve_country(code);
    let name = region_name(region).unwrap_or(region);
    println!(
        "\n{}: {:?} → {} ({})\n",
        GEO_HEADER,
        code.unwrap_or(""),
        region,
        name
    );
}

/// Upload an image and print the public URL to store on a listing
async fn upload(
    storage: &StorageClient,
    uploads: &UploadConfig,
    file: &Path,
    kind: ListingKind,
    content_type: Option<&str>,
) -> anyhow::Result<()> {
    let file_name = file
        .file_name()
        .and_then(|name| name.to_str())
        .context("Upload path has no file name")?;
    let content_type = content_type.unwrap_or_else(|| guess_content_type(file));

    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    info!(
        "Uploading {} ({} bytes, {}) for {}",
        file_name,
        bytes.len(),
        content_type,
        kind
    );

    let url = storage
        .upload(uploads.scope_for(kind), file_name, content_type, bytes)
        .await?;

    println!("{}", url);
    Ok(())
}

/// Content type from the file extension; unknown extensions fail validation
fn guess_content_type(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Show record counts
async fn show_stats(pool: &PgPool) -> anyhow::Result<()> {
    let sweepstakes = SweepstakeRepository::new(pool.clone());
    let testimonials = TestimonialRepository::new(pool.clone());
    let stats = dashboard_stats(&sweepstakes, &testimonials).await?;

    println!("\n📊 Dashboard\n");
    println!("  Sweepstakes:    {}", stats.sweepstakes);
    println!("  Testimonials:   {}", stats.testimonials);
    println!();

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Truncate text to a maximum number of characters, adding ellipsis if needed
fn truncate_text(text: &str, max_len: usize) -> String {
    let cleaned = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if cleaned.chars().count() <= max_len {
        cleaned
    } else {
        let cut: String = cleaned.chars().take(max_len).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_content_type() {
        assert_eq!(guess_content_type(Path::new("a/banner.PNG")), "image/png");
        assert_eq!(guess_content_type(Path::new("me.jpeg")), "image/jpeg");
        assert_eq!(
            guess_content_type(Path::new("notes.txt")),
            "application/octet-stream"
        );
        assert_eq!(guess_content_type(Path::new("noext")), "application/octet-stream");
    }

    #[test]
    fn test_storage_client_requires_url_and_key() {
        let err = storage_client(None, Some("key")).err().unwrap();
        assert!(err.to_string().contains("SWEEPR_STORAGE_URL"));

        let err = storage_client(Some("https://example.com"), None).err().unwrap();
        assert!(err.to_string().contains("SWEEPR_STORAGE_KEY"));

        assert!(storage_client(Some("https://example.com"), Some("key")).is_ok());
    }

    #[test]
    fn test_truncate_text_collapses_whitespace() {
        assert_eq!(truncate_text("a\n  b\tc", 10), "a b c");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
    }

    #[test]
    fn test_truncate_text_multibyte() {
        assert_eq!(truncate_text("ééééé", 2), "éé...");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("sweepstakes"), "Sweepstakes");
        assert_eq!(capitalize(""), "");
    }
}

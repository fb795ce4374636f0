use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use uuid::Uuid;

use sweepr_core::{Direction, ListingKind, NewSweepstake, NewTestimonial};

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "sweepr")]
#[command(author, version, about = "Admin console for the Sweepr sweepstakes site")]
#[command(after_help = "Examples:
  sweepr sweepstakes list
  sweepr sweepstakes move 6f1c0f0e-5b7a-4c8e-9d55-0a3c2b1e4f77 up
  sweepr home --country GB
  sweepr upload ./banner.png --kind sweepstakes
  sweepr stats")]
pub struct Config {
    /// PostgreSQL database connection URL
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Base URL of the object storage service
    #[arg(long, env = "SWEEPR_STORAGE_URL", global = true)]
    pub storage_url: Option<String>,

    /// Service key for the object storage service
    #[arg(long, env = "SWEEPR_STORAGE_KEY", global = true, hide_env_values = true)]
    pub storage_key: Option<String>,

    /// Custom path to sweepr.toml (defaults to ~/.config/sweepr/sweepr.toml)
    #[arg(short, long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage sweepstakes listings
    Sweepstakes {
        #[command(subcommand)]
        action: SweepstakeAction,
    },
    /// Manage testimonials
    Testimonials {
        #[command(subcommand)]
        action: TestimonialAction,
    },
    /// Render the home page a visitor from one country would see
    #[command(after_help = "Examples:
  sweepr home                 # Default region
  sweepr home --country gb    # Resolved to UK
  sweepr home --region US --format json")]
    Home {
        /// Raw country code, as sent by the edge geo header
        #[arg(long, value_name = "CODE", conflicts_with = "region")]
        country: Option<String>,
        /// Region code to render directly, skipping geo resolution
        #[arg(long, value_name = "REGION")]
        region: Option<String>,
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },
    /// Show which region a raw country code resolves to
    Geo {
        /// Raw country code; omit to see the fallback region
        code: Option<String>,
    },
    /// Upload an image to object storage and print its public URL
    #[command(after_help = "Example: sweepr upload ./avatar.jpg --kind testimonials")]
    Upload {
        /// Image file to upload
        file: PathBuf,
        /// Which listing kind the image belongs to
        #[arg(short, long)]
        kind: KindArg,
        /// Override the content type guessed from the file extension
        #[arg(long, value_name = "MIME")]
        content_type: Option<String>,
    },
    /// Show record counts
    Stats,
}

/// Sweepstakes subcommands
#[derive(Subcommand, Debug)]
pub enum SweepstakeAction {
    /// Add a sweepstake at the end of the list
    Add(SweepstakeFields),
    /// Replace every field of an existing sweepstake
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: SweepstakeFields,
    },
    #[command(flatten)]
    Common(ListingAction),
}

/// Testimonials subcommands
#[derive(Subcommand, Debug)]
pub enum TestimonialAction {
    /// Add a testimonial at the end of the list
    Add(TestimonialFields),
    /// Replace every field of an existing testimonial
    Edit {
        id: Uuid,
        #[command(flatten)]
        fields: TestimonialFields,
    },
    #[command(flatten)]
    Common(ListingAction),
}

/// Subcommands shared by both listing kinds
#[derive(Subcommand, Debug)]
pub enum ListingAction {
    /// List all records in display order, inactive ones included
    List,
    /// Delete a record and close the gap it leaves
    Delete { id: Uuid },
    /// Swap a record with its neighbour
    Move {
        id: Uuid,
        #[arg(value_enum)]
        direction: DirectionArg,
    },
    /// Flip a record between active and inactive
    Toggle { id: Uuid },
}

#[derive(Args, Debug, Clone)]
pub struct SweepstakeFields {
    /// Display name
    #[arg(long)]
    pub name: String,
    /// Image URL, typically from `sweepr upload`
    #[arg(long)]
    pub image_url: Option<String>,
    /// Link to the sweepstake
    #[arg(long)]
    pub url: Option<String>,
    /// Region codes, comma separated (e.g. AU,UK)
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,
    /// Store the record as inactive
    #[arg(long)]
    pub inactive: bool,
}

impl From<SweepstakeFields> for NewSweepstake {
    fn from(fields: SweepstakeFields) -> Self {
        NewSweepstake {
            name: fields.name,
            image_url: fields.image_url,
            url: fields.url,
            countries: fields.countries,
            active: !fields.inactive,
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct TestimonialFields {
    /// The quote text
    #[arg(long)]
    pub quote: String,
    /// Who said it
    #[arg(long)]
    pub name: String,
    /// Where they are from
    #[arg(long)]
    pub location: String,
    /// Star rating
    #[arg(long, default_value = "5")]
    pub rating: i16,
    /// Avatar URL, typically from `sweepr upload`
    #[arg(long)]
    pub avatar_url: Option<String>,
    /// Region codes, comma separated (e.g. AU,UK)
    #[arg(long, value_delimiter = ',')]
    pub countries: Vec<String>,
    /// Store the record as inactive
    #[arg(long)]
    pub inactive: bool,
}

impl From<TestimonialFields> for NewTestimonial {
    fn from(fields: TestimonialFields) -> Self {
        NewTestimonial {
            quote: fields.quote,
            name: fields.name,
            location: fields.location,
            rating: fields.rating,
            avatar_url: fields.avatar_url,
            countries: fields.countries,
            active: !fields.inactive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    Up,
    Down,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Direction::Up,
            DirectionArg::Down => Direction::Down,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Sweepstakes,
    Testimonials,
}

impl From<KindArg> for ListingKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Sweepstakes => ListingKind::Sweepstakes,
            KindArg::Testimonials => ListingKind::Testimonials,
        }
    }
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    const ID: &str = "6f1c0f0e-5b7a-4c8e-9d55-0a3c2b1e4f77";

    #[test]
    fn test_command_definition_is_valid() {
        Config::command().debug_assert();
    }

    #[test]
    fn test_parse_sweepstake_move() {
        let config = Config::try_parse_from(["sweepr", "sweepstakes", "move", ID, "up"]).unwrap();
        match config.command {
            Command::Sweepstakes {
                action: SweepstakeAction::Common(ListingAction::Move { id, direction }),
            } => {
                assert_eq!(id.to_string(), ID);
                assert_eq!(Direction::from(direction), Direction::Up);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_direction() {
        let result = Config::try_parse_from(["sweepr", "sweepstakes", "move", ID, "sideways"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_rejects_bad_uuid() {
        let result = Config::try_parse_from(["sweepr", "testimonials", "toggle", "not-a-uuid"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_sweepstake_add_splits_countries() {
        let config = Config::try_parse_from([
            "sweepr",
            "sweepstakes",
            "add",
            "--name",
            "Win a car",
            "--countries",
            "AU,UK",
            "--inactive",
        ])
        .unwrap();
        let Command::Sweepstakes {
            action: SweepstakeAction::Add(fields),
        } = config.command
        else {
            panic!("expected sweepstakes add");
        };
        let new: NewSweepstake = fields.into();
        assert_eq!(new.name, "Win a car");
        assert_eq!(new.countries, vec!["AU", "UK"]);
        assert!(!new.active);
    }

    #[test]
    fn test_parse_testimonial_add_defaults() {
        let config = Config::try_parse_from([
            "sweepr",
            "testimonials",
            "add",
            "--quote",
            "Won a holiday!",
            "--name",
            "Sam",
            "--location",
            "Perth, WA",
        ])
        .unwrap();
        let Command::Testimonials {
            action: TestimonialAction::Add(fields),
        } = config.command
        else {
            panic!("expected testimonials add");
        };
        let new: NewTestimonial = fields.into();
        assert_eq!(new.rating, 5);
        assert_eq!(new.location, "Perth, WA");
        assert!(new.active);
        assert!(new.countries.is_empty());
    }

    #[test]
    fn test_parse_home_country_and_region_conflict() {
        let result =
            Config::try_parse_from(["sweepr", "home", "--country", "GB", "--region", "UK"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_home_json() {
        let config =
            Config::try_parse_from(["sweepr", "home", "--country", "gb", "--format", "json"])
                .unwrap();
        match config.command {
            Command::Home {
                country, format, ..
            } => {
                assert_eq!(country.as_deref(), Some("gb"));
                assert_eq!(format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_upload_kind() {
        let config =
            Config::try_parse_from(["sweepr", "upload", "a.png", "--kind", "testimonials"])
                .unwrap();
        match config.command {
            Command::Upload { kind, file, .. } => {
                assert_eq!(ListingKind::from(kind), ListingKind::Testimonials);
                assert_eq!(file, PathBuf::from("a.png"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let config = Config::try_parse_from([
            "sweepr",
            "stats",
            "--database-url",
            "postgres://localhost/sweepr",
            "-v",
        ])
        .unwrap();
        assert!(config.verbose);
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/sweepr")
        );
    }
}

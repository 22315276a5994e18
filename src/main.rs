use chrono::Local;
use clap::{Parser, Subcommand};
use mosaic_gal::catalog::PhotoCatalog;
use mosaic_gal::config::{self, GalleryConfig};
use mosaic_gal::fetch::SiteFetcher;
use mosaic_gal::imaging::{DEFAULT_FRAME_BORDER, RustBackend};
use mosaic_gal::sync::{SyncOptions, sync};
use mosaic_gal::{frame, output, scan, thumbnails, watch};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "mosaic-gal")]
#[command(about = "Image sync and manifest builder for a static masonry photo gallery")]
#[command(long_about = "\
Image sync and manifest builder for a static masonry photo gallery

Photos live in a source folder, grouped in any subfolders you like. A sync
generates thumbnails, mirrors the folder into the site and writes the
manifest the viewer reads.

Project structure:

  project/
  ├── gallery.toml                 # Optional config (see gen-config)
  ├── images/                      # Source photos
  │   ├── !sunset.jpg              # \"!\" prefix = featured
  │   ├── trips/img2.jpg           # Subfolders are fine
  │   └── thumbnails/              # Generated, mirrors the tree as .jpg
  └── public/
      ├── images/                  # Mirrored copy served to the viewer
      └── images-manifest.json     # Image list with thumbnails and EXIF

Photos sort by file name, numbers compared by value (img2 before img10).

Run 'mosaic-gal gen-config' to generate a documented gallery.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Project root (holds gallery.toml)
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

/// Switches for a single sync run.
#[derive(clap::Args, Clone)]
struct SyncArgs {
    /// Skip the thumbnail step
    #[arg(long)]
    no_thumbs: bool,

    /// Do not read EXIF metadata
    #[arg(long)]
    no_metadata: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Generate thumbnails, mirror images and write the manifest
    Sync(SyncArgs),
    /// Sync once, then again after every change to the source folder
    Watch,
    /// Run only the thumbnail step
    Thumbs,
    /// List the images a sync would publish, without writing anything
    Check,
    /// List the catalog the viewer sees in the built site
    Catalog {
        /// Show one photo (percent-encoded id) with its metadata
        #[arg(long)]
        id: Option<String>,
    },
    /// Write a framed copy of a photo, as the viewer's download does
    Frame {
        /// Photo to frame
        input: PathBuf,
        /// Border thickness in pixels
        #[arg(long, default_value_t = DEFAULT_FRAME_BORDER)]
        border: u32,
        /// Output file (default: timestamped .jpg in the current directory)
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Sync(args) => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            let options = SyncOptions {
                thumbnails: !args.no_thumbs,
                metadata: !args.no_metadata,
            };
            println!("==> Syncing {}", config.layout(&cli.root).source_dir.display());
            run_sync(&cli.root, &config, options)?;
        }
        Command::Watch => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            let layout = config.layout(&cli.root);
            let quiet = Duration::from_millis(config.watch.debounce_ms);
            println!("==> Watching {} (Ctrl-C to stop)", layout.source_dir.display());

            let root = cli.root.clone();
            let options = SyncOptions::default();
            watch::watch(&layout.source_dir, quiet, move || {
                if let Err(e) = run_sync(&root, &config, options) {
                    eprintln!("sync failed: {e}");
                }
            })?;
        }
        Command::Thumbs => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            let layout = config.layout(&cli.root);
            let outcome = thumbnails::run_thumbnail_step(
                &RustBackend::new(),
                &config.thumbnails,
                &config.keep_file,
                &layout.source_dir,
            )?;
            output::print_thumbnail_outcome(&outcome);
        }
        Command::Check => {
            let config = config::load_config(&cli.root)?;
            let source = config.layout(&cli.root).source_dir;
            println!("==> Checking {}", source.display());
            let images = scan::scan_images(&source, &config.keep_file)?;
            output::print_check_output(&images);
        }
        Command::Catalog { id } => {
            let config = config::load_config(&cli.root)?;
            let layout = config.layout(&cli.root);
            let catalog = PhotoCatalog::new(
                SiteFetcher::new(layout.site_root),
                config.manifest_url(),
                config.images_url_base(),
            );
            match id {
                Some(id) => match catalog.find(&id) {
                    Some(photo) => output::print_photo_detail(&photo),
                    None => return Err(format!("no photo with id {id}").into()),
                },
                None => output::print_catalog(&catalog.list_all()),
            }
        }
        Command::Frame {
            input,
            border,
            output: target,
        } => {
            let backend = RustBackend::new();
            let export = match target {
                Some(path) => frame::export_framed_to(&backend, &input, &path, border)?,
                None => frame::export_framed(&backend, &input, Path::new("."), border, Local::now())?,
            };
            output::print_frame_export(&export);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// One sync with progress printed from a separate thread.
fn run_sync(root: &Path, config: &GalleryConfig, options: SyncOptions) -> Result<(), Box<dyn std::error::Error>> {
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_sync_event(&event);
        }
    });
    let result = sync(root, config, &RustBackend::new(), options, Some(tx));
    printer.join().map_err(|_| "output thread panicked")?;
    output::print_sync_summary(&result?);
    Ok(())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}

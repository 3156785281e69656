//! # Thermalize CLI
//!
//! Command-line interface for encoding receipts.
//!
//! ## Usage
//!
//! ```bash
//! # List supported dialects and paper profiles
//! thermalize list
//!
//! # Encode a text file for an ESC/POS printer
//! thermalize encode --dialect escape receipt.txt -o receipt.bin
//!
//! # 58mm Star printer, logo on top, cut at the end
//! thermalize encode --dialect star --profile 58mm --image logo.png --cut receipt.txt -o out.bin
//!
//! # Preview as PostScript
//! thermalize encode --dialect postscript --qr https://example.com receipt.txt -o receipt.ps
//! ```
//!
//! Tabs in the text file advance to the next tab stop. Set `RUST_LOG=debug`
//! to trace image transfers and page breaks.

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use thermalize::{
    BarcodeMode, Dialect, ImageTransfer, Options, PrinterProfile, ThermalizeError, open,
    options::Alignment,
    render::symbols::{BarcodeImages, QrImages},
};

/// Thermalize - receipt printer control-code encoder
#[derive(Parser, Debug)]
#[command(name = "thermalize")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List dialects and paper profiles
    List,

    /// Encode a text file (and optional image, QR code, barcode)
    Encode {
        /// Text file to print, one printed line per input line
        input: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Printer dialect
        #[arg(long, default_value = "escape")]
        dialect: Dialect,

        /// Paper profile
        #[arg(long, default_value = "80mm")]
        profile: PrinterProfile,

        /// Image printed above the text, centered
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        /// Print the image inverted
        #[arg(long)]
        invert: bool,

        /// Gray level used to threshold the image (0-255)
        #[arg(long)]
        gray_level: Option<u8>,

        /// Image transfer command family
        #[arg(long, value_enum)]
        transfer: Option<Transfer>,

        /// Left margin in millimeters
        #[arg(long)]
        margin_mm: Option<f32>,

        /// QR code printed below the text
        #[arg(long)]
        qr: Option<String>,

        /// Code39 barcode printed below the text (digits, A-Z, space, -.$/+%)
        #[arg(long)]
        barcode: Option<String>,

        /// Draw barcodes and QR codes as images instead of native commands
        #[arg(long)]
        symbols_as_images: bool,

        /// PostScript page height in points
        #[arg(long)]
        page_height: Option<f64>,

        /// Feed and cut the paper at the end
        #[arg(long)]
        cut: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Transfer {
    Legacy,
    Graphics,
    Banded,
}

impl From<Transfer> for ImageTransfer {
    fn from(t: Transfer) -> Self {
        match t {
            Transfer::Legacy => ImageTransfer::Legacy,
            Transfer::Graphics => ImageTransfer::Graphics,
            Transfer::Banded => ImageTransfer::Banded,
        }
    }
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), ThermalizeError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            println!("Dialects:");
            for dialect in Dialect::ALL {
                println!("  {}", dialect.name());
            }
            println!("\nProfiles:");
            for p in PrinterProfile::ALL {
                println!(
                    "  {:<6} {} columns, {} dots ({:.0}mm printable)",
                    p.name,
                    p.cpl,
                    p.ppl,
                    p.width_mm()
                );
            }
            Ok(())
        }
        Commands::Encode {
            input,
            output,
            dialect,
            profile,
            image,
            invert,
            gray_level,
            transfer,
            margin_mm,
            qr,
            barcode,
            symbols_as_images,
            page_height,
            cut,
        } => {
            let text = std::fs::read_to_string(&input)?;
            let picture = match image {
                Some(path) => Some(
                    image::open(&path)
                        .map_err(|e| ThermalizeError::Image(format!("{}: {}", path.display(), e)))?,
                ),
                None => None,
            };

            let mut opts = Options::new();
            if let Some(level) = gray_level {
                opts = opts.gray_level(level);
            }
            if let Some(t) = transfer {
                opts = opts.image_transfer(t.into());
            }
            if let Some(h) = page_height {
                opts = opts.page_height(h);
            }
            // PostScript has no native symbols.
            if symbols_as_images || dialect == Dialect::Postscript {
                opts = opts.barcode_generator(BarcodeImages).qr_generator(QrImages);
            }

            let sink: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path)?)),
                None => Box::new(io::stdout().lock()),
            };

            info!(
                "encoding {} for {} on {} paper",
                input.display(),
                dialect.name(),
                profile.name
            );

            let mut cmd = open(dialect, profile.cpl, profile.ppl, sink, opts);
            cmd.init()?;

            if let Some(mm) = margin_mm {
                cmd.left_margin(profile.mm_to_dots(mm))?;
            }

            if let Some(img) = &picture {
                cmd.align(Alignment::Center.into())?;
                cmd.image(img, invert)?;
                cmd.align(Alignment::Left.into())?;
            }

            for line in text.lines() {
                for (i, part) in line.split('\t').enumerate() {
                    if i > 0 {
                        cmd.tab()?;
                    }
                    cmd.text(part, None)?;
                }
                cmd.line_feed()?;
            }

            if qr.is_some() || barcode.is_some() {
                cmd.align(Alignment::Center.into())?;
            }
            if let Some(data) = &qr {
                cmd.qr_code_size(6)?;
                cmd.qr_code(data)?;
                cmd.line_feed()?;
            }
            if let Some(data) = &barcode {
                cmd.barcode_height(80)?;
                cmd.hri_position(2)?;
                cmd.barcode(BarcodeMode::Code39.into(), &data.to_ascii_uppercase())?;
                cmd.line_feed()?;
            }

            if cut {
                cmd.full_cut()?;
            }
            cmd.print()?;

            if let Some(path) = &output {
                info!("wrote {}", path.display());
            }
            Ok(())
        }
    }
}

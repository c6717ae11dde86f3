//! Print the text of a Word (.doc) file.
//!
//! ```text
//! cargo run --example extract_text -- document.doc --details
//! RUST_LOG=debug cargo run --example extract_text -- document.doc --codepage 1251
//! ```

use clap::Parser;
use doc_text::doc::{ExtractOptions, Package};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(about = "Extract plain text from a legacy Word document")]
struct Args {
    /// Path to the .doc file
    path: PathBuf,

    /// Windows code page for unmapped high bytes (default 936)
    #[arg(long)]
    codepage: Option<u32>,

    /// Disable the code page fallback
    #[arg(long, conflicts_with = "codepage")]
    no_fallback: bool,

    /// Decode pieces in parallel
    #[arg(long)]
    parallel: bool,

    /// Print FIB and piece table details before the text
    #[arg(long)]
    details: bool,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let mut options = ExtractOptions::new().with_parallel(args.parallel);
    if args.no_fallback {
        options = options.with_fallback_codepage(None);
    } else if let Some(codepage) = args.codepage {
        options = options.with_fallback_codepage(Some(codepage));
    }

    let result = Package::open(&args.path).and_then(|package| package.with_options(options).document());
    let doc = match result {
        Ok(doc) => doc,
        Err(err) => {
            eprintln!("{}: {}", args.path.display(), err);
            return ExitCode::FAILURE;
        },
    };

    if args.details {
        let fib = doc.fib();
        println!("nFib:         0x{:04X}", fib.version());
        println!("Language:     0x{:04X}", fib.language_id());
        println!("Table stream: {}", fib.table_stream_name());
        println!("Fast saved:   {}", fib.is_complex());
        println!("ccpText:      {}", fib.main_text_len());
        println!("CLX:          {} bytes at {}", fib.clx_length(), fib.clx_offset());
        println!("Pieces:       {}", doc.piece_table().len());
        for (i, piece) in doc.piece_table().pieces().iter().enumerate() {
            let cps = &doc.piece_table().boundaries()[i..i + 2];
            println!(
                "  #{:<4} CP {:>8}..{:<8} offset {:>8} {:?}",
                i, cps[0], cps[1], piece.byte_offset, piece.encoding
            );
        }
        println!();
    }

    println!("{}", doc.text());
    ExitCode::SUCCESS
}

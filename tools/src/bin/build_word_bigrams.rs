// tools/src/bin/build_word_bigrams.rs
//
// Compile a word bigram list into the bincode model read by the grammar.
//
// Usage:
//   cargo run --bin build_word_bigrams -- --input data/word_bigrams.tsv --output data/word_bigram.bin
//
// Input lines are `word1<TAB>word2<TAB>count`; repeated pairs accumulate.

use anyhow::Result;
use clap::Parser;
use libranking::WordBigram;
use std::path::PathBuf;

#[derive(Parser)]
struct Args {
    #[arg(long)]
    input: PathBuf,

    #[arg(long, default_value = "word_bigram.bin")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("Reading bigrams from {}...", args.input.display());
    let model = WordBigram::from_tsv(&args.input)?;

    println!("Saving to {}...", args.output.display());
    model.save(&args.output)?;

    println!("\n✓ Word bigram model written");
    println!("  Heads: {}", model.len());
    println!("  Bigram entries: {}", model.total_bigrams());
    Ok(())
}

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use language_utils::Language;
use multiword_terms::batch::{annotate_file, write_pending_file};
use multiword_terms::detector::{DetectorConfig, MultiwordTermDetector};
use multiword_terms::frequencies::{
    compute_frequencies, read_annotated_file, write_frequencies_file,
};
use multiword_terms::lexicon::load_lexicon;
use multiword_terms::nlp::TokenizationCache;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the multiword terms found in each sentence
    Detect {
        #[command(flatten)]
        detector: DetectorArgs,

        sentences: Vec<String>,
    },
    /// Annotate a JSONL file of sentence records
    Annotate {
        #[command(flatten)]
        detector: DetectorArgs,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// List the terms and sentences the tokenization file does not cover yet
    Pending {
        #[command(flatten)]
        detector: DetectorArgs,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
    /// Count term occurrences in an annotated JSONL file
    Frequencies {
        /// Language code (ISO 639-3)
        #[arg(short, long, default_value = "fra")]
        language: String,

        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DetectorArgs {
    /// Multiword terms, one per line
    #[arg(long)]
    lexicon: PathBuf,

    /// JSONL tokenization file written by the NLP pipeline
    #[arg(long)]
    parses: PathBuf,

    /// Language code (ISO 639-3)
    #[arg(short, long, default_value = "fra")]
    language: String,

    /// Don't match elided endings ("qu'est-ce qu'" for "qu'est-ce que")
    #[arg(long)]
    no_contractions: bool,

    /// Don't allow negation particles inside verb-headed terms
    #[arg(long)]
    no_negation: bool,

    /// Don't allow inverted subject clitics inside verb-headed terms
    #[arg(long)]
    no_inversion: bool,
}

fn parse_language(code: &str) -> Result<Language> {
    Language::from_iso_639_3(code).ok_or_else(|| anyhow!("Unsupported language code: {code}"))
}

impl DetectorArgs {
    fn config(&self) -> Result<DetectorConfig> {
        Ok(DetectorConfig {
            language: parse_language(&self.language)?,
            contraction_variants: !self.no_contractions,
            negation_variants: !self.no_negation,
            inversion_variants: !self.no_inversion,
        })
    }

    fn load_cache(&self) -> Result<TokenizationCache> {
        TokenizationCache::from_file(&self.parses).context("Failed to load tokenization file")
    }

    fn build(&self) -> Result<MultiwordTermDetector<TokenizationCache>> {
        let config = self.config()?;
        let cache = self.load_cache()?;
        let detector = MultiwordTermDetector::from_lexicon_file(cache, &self.lexicon, &config)
            .context("Failed to load lexicon")?;
        println!(
            "Compiled {} patterns for {} terms",
            detector.patterns().len(),
            detector.patterns().terms().len()
        );
        Ok(detector)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Detect {
            detector,
            sentences,
        } => {
            let detector = detector.build()?;
            for sentence in sentences {
                let (parsed, matches) = detector.detect(&sentence);
                println!();
                println!("{sentence}");
                if parsed.is_empty() {
                    println!("  (not in tokenization file)");
                    continue;
                }
                for m in matches {
                    println!(
                        "  {} [{}..{}] \"{}\" ({}, {})",
                        m.term,
                        m.start,
                        m.end,
                        parsed.span_text(m.start..m.end),
                        m.variant,
                        m.confidence
                    );
                }
            }
        }
        Command::Annotate {
            detector,
            input,
            output,
        } => {
            let detector = detector.build()?;
            annotate_file(&detector, &input, &output)
                .with_context(|| format!("Failed to annotate {}", input.display()))?;
        }
        Command::Pending {
            detector,
            input,
            output,
        } => {
            let config = detector.config()?;
            let cache = detector.load_cache()?;
            let lexicon =
                load_lexicon(&detector.lexicon, config.language).context("Failed to load lexicon")?;
            write_pending_file(&cache, &lexicon, &input, &output)?;
        }
        Command::Frequencies {
            language,
            input,
            output,
        } => {
            let language = parse_language(&language)?;
            let sentences = read_annotated_file(&input)?;
            let frequencies = compute_frequencies(&sentences, language);
            println!("Counted {} distinct terms", frequencies.len());
            write_frequencies_file(frequencies, &output)?;
        }
    }

    Ok(())
}

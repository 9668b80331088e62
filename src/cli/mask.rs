use std::path::PathBuf;
use std::sync::Arc;

use crate::error::Result;
use crate::mask::MaskingPipeline;
use crate::proxy::decode_document;
use crate::recognizer::GazetteerRecognizer;

/// Print the masked text. The token map is dropped here: masking without a
/// round trip is for inspecting what would leave the machine.
pub fn run(config: Option<&PathBuf>, file: Option<&PathBuf>) -> Result<()> {
    let (config, base_dir) = super::load_config(config)?;
    let recognizer = GazetteerRecognizer::new(&config.recognizer.entries(&base_dir)?)?;
    let pipeline = MaskingPipeline::from_config(&config.masking, Arc::new(recognizer))?;

    let bytes = super::read_input(file)?;
    let masked = pipeline.mask(&decode_document(&bytes))?;

    print!("{}", masked.text);
    eprintln!("maskgate: {} value(s) masked", masked.tokens.len());
    Ok(())
}

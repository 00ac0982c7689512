//! Checkpoint command implementation.

use crate::output;
use ibmi_cdc_engine::CheckpointFile;

pub fn run(file: String, reset: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let checkpoint_file = CheckpointFile::new(&file);

    if reset {
        checkpoint_file
            .reset()
            .map_err(|e| format!("Failed to reset checkpoint: {}: {}", file, e))?;
        println!("Checkpoint reset to start of journal: {}", file);
        return Ok(());
    }

    let checkpoint = checkpoint_file
        .load()
        .map_err(|e| format!("Failed to read checkpoint: {}: {}", file, e))?
        .ok_or_else(|| format!("No checkpoint at {}", file))?;

    if json {
        println!("{}", output::format_json(&checkpoint));
        return Ok(());
    }

    if checkpoint.is_start_of_journal() {
        println!("position:       start of journal");
    } else {
        println!("receiver:       {}", checkpoint.receiver());
        println!("offset:         {}", checkpoint.offset());
        println!("processed:      {}", checkpoint.processed);
        println!("next to read:   {}", checkpoint.next_to_read());
    }
    println!(
        "last processed: {}",
        output::format_time(checkpoint.last_processed_time.as_ref())
    );
    Ok(())
}

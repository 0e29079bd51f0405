//! Interactive device selection prompt

use crate::device::DeviceChooser;
use crate::types::Device;
use std::io::{self, BufRead, Write};

const MAX_ATTEMPTS: u32 = 3;

/// Device picker reading a 1-based index from stdin
///
/// Invalid input is re-prompted up to three times; EOF or exhausted
/// attempts cancel the selection.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinChooser;

impl DeviceChooser for StdinChooser {
    fn choose(&self, devices: &[Device]) -> Option<usize> {
        println!("\nMultiple devices detected. Select one:");
        for (index, device) in devices.iter().enumerate() {
            println!("  {}. {}", index + 1, device.display_name());
        }

        let stdin = io::stdin();
        let mut input = String::new();
        for _ in 0..MAX_ATTEMPTS {
            print!("Select device [1-{}]: ", devices.len());
            let _ = io::stdout().flush();

            input.clear();
            match stdin.lock().read_line(&mut input) {
                Ok(0) | Err(_) => return None,
                Ok(_) => {}
            }

            match parse_choice(&input, devices.len()) {
                Some(index) => return Some(index),
                None => println!(
                    "Invalid choice. Enter a number between 1 and {}.",
                    devices.len()
                ),
            }
        }
        None
    }
}

/// Parse a 1-based selection into a 0-based index
fn parse_choice(input: &str, count: usize) -> Option<usize> {
    let selected: usize = input.trim().parse().ok()?;
    if (1..=count).contains(&selected) {
        Some(selected - 1)
    } else {
        None
    }
}

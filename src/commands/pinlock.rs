// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::pin::PinVault;
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    let vault = PinVault::open_default()?;
    match m.subcommand() {
        Some(("set", sub)) => {
            let pin = sub.get_one::<String>("pin").unwrap();
            vault.set(pin)?;
            println!("PIN set");
        }
        Some(("verify", sub)) => {
            let pin = sub.get_one::<String>("pin").unwrap();
            if vault.verify(pin)? {
                println!("PIN ok");
            } else {
                println!("PIN mismatch");
                std::process::exit(1);
            }
        }
        Some(("clear", _)) => {
            if vault.clear()? {
                println!("PIN removed");
            } else {
                println!("No PIN was set");
            }
        }
        _ => {}
    }
    Ok(())
}

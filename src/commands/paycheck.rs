// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::schedule;
use crate::store;
use crate::utils::{maybe_print_json, pretty_table, today};
use crate::validate;
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &mut Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let raw = sub.get_one::<String>("last-date").unwrap();
            let date = validate::date(raw, today()).into_result()?;
            store::set_paycheck_settings(conn, Some(date))?;
            let dates = schedule::paycheck_dates(Some(date), today());
            match dates.next_pay_date {
                Some(next) => println!("Last paycheck {}; next projected for {}", date, next),
                None => println!("Last paycheck {}", date),
            }
        }
        Some(("show", sub)) => {
            let settings = store::get_paycheck_settings(conn)?;
            let dates = schedule::paycheck_dates(settings.last_paycheck_date, today());
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &dates)? {
                match (dates.next_pay_date, dates.following_pay_date) {
                    (Some(next), Some(following)) => {
                        let rows = vec![
                            vec![
                                "Next payday".to_string(),
                                next.to_string(),
                                format!("{} day(s)", dates.days_until_next_pay.unwrap_or(0)),
                            ],
                            vec![
                                "Following payday".to_string(),
                                following.to_string(),
                                format!("{} day(s)", dates.days_until_following_pay.unwrap_or(0)),
                            ],
                        ];
                        println!("{}", pretty_table(&["", "Date", "In"], rows));
                    }
                    _ => println!(
                        "No paycheck date recorded; run `digibook paycheck set --last-date YYYY-MM-DD`"
                    ),
                }
            }
        }
        _ => {}
    }
    Ok(())
}

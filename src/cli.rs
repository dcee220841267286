// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command};

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .help("Print as JSON lines"),
    )
}

fn req(name: &'static str) -> Arg {
    Arg::new(name).long(name).required(true)
}

fn opt(name: &'static str) -> Arg {
    Arg::new(name).long(name)
}

pub fn build_cli() -> Command {
    Command::new("digibook")
        .about("Digibook: single-device personal finance ledger with paycheck-aware expense tracking")
        .version(clap::crate_version!())
        .subcommand(Command::new("init").about("Initialise the database"))
        .subcommand(
            Command::new("account")
                .about("Manage checking/savings accounts")
                .subcommand(
                    Command::new("add")
                        .about("Add an account")
                        .arg(req("name"))
                        .arg(
                            opt("type")
                                .default_value("checking")
                                .help("checking or savings"),
                        )
                        .arg(opt("balance").default_value("0").help("Opening balance")),
                )
                .subcommand(json_flags(Command::new("list").about("List accounts")))
                .subcommand(
                    Command::new("set-default")
                        .about("Make an account the default funding account")
                        .arg(req("id")),
                )
                .subcommand(
                    Command::new("update")
                        .about("Update an account")
                        .arg(req("id"))
                        .arg(opt("name"))
                        .arg(opt("balance")),
                )
                .subcommand(Command::new("rm").about("Delete an account").arg(req("id"))),
        )
        .subcommand(
            Command::new("card")
                .about("Manage credit cards")
                .subcommand(
                    Command::new("add")
                        .about("Add a credit card")
                        .arg(req("name"))
                        .arg(opt("balance").default_value("0"))
                        .arg(opt("limit").default_value("0").help("Credit limit"))
                        .arg(opt("rate").default_value("0").help("Annual interest rate %"))
                        .arg(req("due").help("Payment due date YYYY-MM-DD"))
                        .arg(opt("closing").help("Statement closing date YYYY-MM-DD"))
                        .arg(opt("min").default_value("0").help("Minimum payment")),
                )
                .subcommand(json_flags(Command::new("list").about("List credit cards")))
                .subcommand(
                    Command::new("update")
                        .about("Update a credit card")
                        .arg(req("id"))
                        .arg(opt("name"))
                        .arg(opt("balance"))
                        .arg(opt("limit"))
                        .arg(opt("min"))
                        .arg(opt("due")),
                )
                .subcommand(Command::new("rm").about("Delete a credit card").arg(req("id"))),
        )
        .subcommand(
            Command::new("category")
                .about("Manage expense categories")
                .subcommand(
                    Command::new("add")
                        .about("Add a category")
                        .arg(req("name"))
                        .arg(opt("icon").default_value(""))
                        .arg(opt("color").default_value("").help("#RRGGBB")),
                )
                .subcommand(json_flags(Command::new("list").about("List categories")))
                .subcommand(
                    Command::new("rename")
                        .about("Rename a category (expense references follow)")
                        .arg(req("id"))
                        .arg(req("name")),
                )
                .subcommand(Command::new("rm").about("Delete a category").arg(req("id"))),
        )
        .subcommand(
            Command::new("expense")
                .about("Manage fixed expenses and pay them")
                .subcommand(
                    Command::new("add")
                        .about("Add a fixed expense")
                        .arg(req("name"))
                        .arg(req("due").help("Due date YYYY-MM-DD"))
                        .arg(req("amount"))
                        .arg(req("category"))
                        .arg(opt("account-id").help(
                            "Funding account id, or a credit card id to charge the expense to",
                        ))
                        .arg(opt("target-card-id").help(
                            "Card being paid down (Credit Card Payment expenses only)",
                        )),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List expenses with their paycheck classification")
                        .arg(opt("category")),
                ))
                .subcommand(
                    Command::new("pay")
                        .about("Set the paid amount of an expense")
                        .arg(req("id"))
                        .arg(req("amount").help("New total paid amount")),
                )
                .subcommand(
                    Command::new("mark-paid")
                        .about("Pay an expense in full")
                        .arg(req("id")),
                )
                .subcommand(
                    Command::new("reassign-account")
                        .about("Move an expense to a different account or card")
                        .arg(req("id"))
                        .arg(opt("account-id").help("Omit to unlink the expense")),
                )
                .subcommand(
                    Command::new("reassign-category")
                        .about("Move an expense to a different category")
                        .arg(req("id"))
                        .arg(req("category")),
                )
                .subcommand(
                    Command::new("update")
                        .about("Update an expense")
                        .arg(req("id"))
                        .arg(opt("name"))
                        .arg(opt("due"))
                        .arg(opt("amount")),
                )
                .subcommand(Command::new("rm").about("Delete an expense").arg(req("id")))
                .subcommand(json_flags(
                    Command::new("summary").about("Totals per paycheck bucket"),
                )),
        )
        .subcommand(
            Command::new("pending")
                .about("Track uncleared transactions")
                .subcommand(
                    Command::new("add")
                        .about("Add a pending transaction")
                        .arg(req("account-id"))
                        .arg(req("amount").help("Negative = outflow, positive = inflow"))
                        .arg(req("category"))
                        .arg(opt("description").default_value("")),
                )
                .subcommand(json_flags(Command::new("list").about("List pending transactions")))
                .subcommand(
                    Command::new("complete")
                        .about("Apply a pending transaction to its account and remove it")
                        .arg(req("id")),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a pending transaction without applying it")
                        .arg(req("id")),
                ),
        )
        .subcommand(
            Command::new("paycheck")
                .about("Biweekly paycheck schedule")
                .subcommand(
                    Command::new("set")
                        .about("Record the most recent paycheck date")
                        .arg(req("last-date").help("YYYY-MM-DD")),
                )
                .subcommand(json_flags(
                    Command::new("show").about("Show the projected paydays"),
                )),
        )
        .subcommand(
            Command::new("recurring")
                .about("Recurring expense templates")
                .subcommand(
                    Command::new("add")
                        .about("Add a template")
                        .arg(req("name"))
                        .arg(req("amount"))
                        .arg(
                            opt("frequency")
                                .default_value("monthly")
                                .help("monthly|quarterly|biannually|annually|custom"),
                        )
                        .arg(
                            opt("interval")
                                .default_value("1")
                                .help("Months between occurrences (custom only)"),
                        )
                        .arg(req("start").help("First due date YYYY-MM-DD"))
                        .arg(req("category"))
                        .arg(opt("account-id"))
                        .arg(
                            opt("variable")
                                .action(ArgAction::SetTrue)
                                .help("Amount varies per occurrence"),
                        )
                        .arg(opt("notes").default_value("")),
                )
                .subcommand(json_flags(Command::new("list").about("List templates")))
                .subcommand(
                    Command::new("run")
                        .about("Materialise due occurrences as fixed expenses")
                        .arg(opt("through").help("Instantiate through this date (default today)")),
                )
                .subcommand(Command::new("rm").about("Delete a template").arg(req("id"))),
        )
        .subcommand(
            Command::new("export")
                .about("Export the ledger")
                .subcommand(
                    Command::new("json")
                        .about("Full snapshot as one JSON file")
                        .arg(req("out")),
                )
                .subcommand(
                    Command::new("csv")
                        .about("One CSV file per table")
                        .arg(req("out-dir")),
                ),
        )
        .subcommand(
            Command::new("import")
                .about("Import a ledger snapshot (replaces all data)")
                .subcommand(
                    Command::new("json")
                        .about("Import a JSON snapshot")
                        .arg(req("file")),
                ),
        )
        .subcommand(
            Command::new("audit")
                .about("Audit log")
                .subcommand(json_flags(
                    Command::new("list")
                        .about("List audit records, newest first")
                        .arg(opt("limit")),
                ))
                .subcommand(Command::new("clear").about("Clear the audit log")),
        )
        .subcommand(
            Command::new("pin")
                .about("Lock-screen PIN")
                .subcommand(Command::new("set").about("Set the PIN").arg(req("pin")))
                .subcommand(Command::new("verify").about("Verify a PIN").arg(req("pin")))
                .subcommand(Command::new("clear").about("Remove the PIN")),
        )
        .subcommand(
            Command::new("reset")
                .about("Erase all data and re-seed defaults")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Confirm the wipe"),
                ),
        )
        .subcommand(Command::new("doctor").about("Check ledger invariants"))
}

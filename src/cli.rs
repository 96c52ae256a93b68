// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn month_arg() -> Arg {
    Arg::new("month")
        .long("month")
        .value_name("YYYY-MM")
        .help("Month to work on (defaults to the current month)")
}

fn tx_field_args(required: bool) -> Vec<Arg> {
    vec![
        Arg::new("type")
            .long("type")
            .value_name("income|expense")
            .required(required),
        Arg::new("title").long("title").required(required),
        Arg::new("amount").long("amount").required(required),
        Arg::new("category").long("category").required(required),
        Arg::new("date")
            .long("date")
            .value_name("YYYY-MM-DD")
            .help("Defaults to today"),
        Arg::new("description").long("description").alias("note"),
    ]
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .about("Track income and expenses against monthly budgets")
        .version(clap::crate_version!())
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .value_name("PATH")
                .help("SQLite file (default: $TALLYBOOK_DB or the platform data dir)"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .help("User id to act as (default: $TALLYBOOK_USER)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print JSON instead of tables"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(
                    Command::new("add")
                        .about("Record a transaction")
                        .args(tx_field_args(true)),
                )
                .subcommand(
                    Command::new("edit")
                        .about("Change a transaction; omitted fields keep their value")
                        .arg(Arg::new("id").required(true))
                        .args(tx_field_args(false))
                        .arg(
                            Arg::new("clear-description")
                                .long("clear-description")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("description"),
                        ),
                )
                .subcommand(
                    Command::new("rm")
                        .about("Delete a transaction (press Enter within 5 seconds to undo)")
                        .arg(Arg::new("id").required(true))
                        .arg(
                            Arg::new("now")
                                .long("now")
                                .action(ArgAction::SetTrue)
                                .help("Delete immediately without an undo window"),
                        ),
                )
                .subcommand(
                    Command::new("list")
                        .about("List transactions for a month")
                        .arg(month_arg())
                        .arg(Arg::new("search").long("search").short('s'))
                        .arg(
                            Arg::new("sort")
                                .long("sort")
                                .value_name("date-desc|date-asc|amount-desc|amount-asc")
                                .default_value("date-desc"),
                        )
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                )
                .subcommand(
                    Command::new("claim").about("Assign transactions without an owner to the user"),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly budgets")
                .subcommand(
                    Command::new("set")
                        .about("Update the month's budget")
                        .arg(month_arg())
                        .arg(
                            Arg::new("category")
                                .long("category")
                                .short('c')
                                .value_name("NAME=AMOUNT")
                                .action(ArgAction::Append),
                        )
                        .arg(Arg::new("overall").long("overall").value_name("AMOUNT"))
                        .arg(
                            Arg::new("replace")
                                .long("replace")
                                .action(ArgAction::SetTrue)
                                .help("Drop category amounts not given on the command line"),
                        ),
                )
                .subcommand(
                    Command::new("show")
                        .about("Budget, rollover and spending for a month")
                        .arg(month_arg()),
                ),
        )
        .subcommand(
            Command::new("settings").about("User settings").subcommand(
                Command::new("rollover")
                    .about("Carry unused category budget into the next month")
                    .arg(
                        Arg::new("state")
                            .required(true)
                            .value_parser(["on", "off"]),
                    ),
            ),
        )
        .subcommand(
            Command::new("report")
                .about("Reports")
                .subcommand(
                    Command::new("summary")
                        .about("Totals and category breakdown for a month")
                        .arg(month_arg())
                        .arg(Arg::new("search").long("search").short('s')),
                )
                .subcommand(
                    Command::new("range")
                        .about("Transactions between two dates (default: last 30 days)")
                        .arg(Arg::new("start").long("start").value_name("YYYY-MM-DD"))
                        .arg(Arg::new("end").long("end").value_name("YYYY-MM-DD")),
                )
                .subcommand(
                    Command::new("chart")
                        .about("Daily income and expenses for a month")
                        .arg(month_arg()),
                ),
        )
        .subcommand(
            Command::new("export").about("Export data").subcommand(
                Command::new("csv")
                    .about("Write a date range to report-<start>-to-<end>.csv")
                    .arg(Arg::new("start").long("start").value_name("YYYY-MM-DD"))
                    .arg(Arg::new("end").long("end").value_name("YYYY-MM-DD"))
                    .arg(
                        Arg::new("out-dir")
                            .long("out-dir")
                            .value_name("DIR")
                            .default_value("."),
                    ),
            ),
        )
        .subcommand(Command::new("doctor").about("Check stored transactions for problems"))
}

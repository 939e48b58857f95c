/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

mod config;
mod scenario;

use crate::config::Config;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command()]
struct BrokerArgs {
    #[arg(short, long, value_name = "FILE")]
    config: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    info!("Started vms-broker-configurable");

    let args = BrokerArgs::parse();
    let config = Config::load(&args.config)?;

    let report = scenario::run(config).await?;
    info!(
        generation = report.available_layers.generation,
        available_layers = report.available_layers.layers.len(),
        sequence = report.subscription_state.sequence,
        publishes = report.deliveries.len(),
        delivered = report.deliveries.iter().sum::<usize>(),
        "scenario complete"
    );
    for (subscriber, received) in &report.received {
        info!(subscriber = %subscriber, received, "subscriber summary");
    }

    Ok(())
}

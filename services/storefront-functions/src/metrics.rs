// SPDX-FileCopyrightText: 2026 Blacklabspotsshop contributors
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Prometheus counters for request outcomes.

use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

pub struct Metrics {
    registry: Registry,
    contact_requests: IntCounterVec,
    media_requests: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let contact_requests = IntCounterVec::new(
            Opts::new("contact_requests_total", "Contact submissions by outcome"),
            &["outcome"],
        )?;
        let media_requests = IntCounterVec::new(
            Opts::new("media_requests_total", "Media generation requests by outcome"),
            &["endpoint", "outcome"],
        )?;

        registry.register(Box::new(contact_requests.clone()))?;
        registry.register(Box::new(media_requests.clone()))?;

        Ok(Self {
            registry,
            contact_requests,
            media_requests,
        })
    }

    pub fn record_contact(&self, outcome: &str) {
        self.contact_requests.with_label_values(&[outcome]).inc();
    }

    pub fn record_media(&self, endpoint: &str, outcome: &str) {
        self.media_requests
            .with_label_values(&[endpoint, outcome])
            .inc();
    }

    pub fn contact_count(&self, outcome: &str) -> u64 {
        self.contact_requests.with_label_values(&[outcome]).get()
    }

    /// Text exposition of every registered family.
    pub fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

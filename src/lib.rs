//! Inventory stock & fulfillment engine for a multi-outlet beverage retail
//! chain.
//!
//! The crate is the domain core behind the warehouse, outlet and owner
//! screens of the point-of-sale client: a stock ledger keyed by
//! `(location, material)`, the transfer-request and outgoing-goods state
//! machines that move stock from the central warehouse to outlets, supplier
//! receipt recording, and physical stock-count (opname) reconciliation.
//! Transport, authentication and rendering live in the API layer that
//! consumes this crate.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod logging;
pub mod migrator;
pub mod queries;
pub mod services;

use sea_orm::DatabaseConnection;
use std::sync::Arc;

use services::incoming_goods::IncomingGoodsService;
use services::materials::MaterialService;
use services::outgoing_goods::OutgoingGoodsService;
use services::stock_ledger::StockLedgerService;
use services::stock_opname::StockOpnameService;
use services::transfer_requests::TransferRequestService;

/// All engine services wired over one database pool and event channel.
#[derive(Clone)]
pub struct AppServices {
    pub materials: Arc<MaterialService>,
    pub stock_ledger: Arc<StockLedgerService>,
    pub transfer_requests: Arc<TransferRequestService>,
    pub outgoing_goods: Arc<OutgoingGoodsService>,
    pub incoming_goods: Arc<IncomingGoodsService>,
    pub stock_opname: Arc<StockOpnameService>,
}

/// Engine state handed to the embedding API layer.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: Arc<events::EventSender>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: Arc<events::EventSender>,
    ) -> Self {
        let stock_ledger = Arc::new(StockLedgerService::new(db.clone(), event_sender.clone()));
        let services = AppServices {
            materials: Arc::new(MaterialService::new(db.clone(), event_sender.clone())),
            transfer_requests: Arc::new(TransferRequestService::new(
                db.clone(),
                event_sender.clone(),
            )),
            outgoing_goods: Arc::new(OutgoingGoodsService::new(
                db.clone(),
                event_sender.clone(),
                stock_ledger.clone(),
                config.reservation_policy,
            )),
            incoming_goods: Arc::new(IncomingGoodsService::new(
                db.clone(),
                event_sender.clone(),
                stock_ledger.clone(),
            )),
            stock_opname: Arc::new(StockOpnameService::new(
                db.clone(),
                event_sender.clone(),
                stock_ledger.clone(),
            )),
            stock_ledger,
        };

        Self {
            db,
            config,
            event_sender,
            services,
        }
    }
}

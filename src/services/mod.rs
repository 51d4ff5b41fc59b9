pub mod incoming_goods;
pub mod materials;
pub mod outgoing_goods;
pub mod stock_ledger;
pub mod stock_opname;
pub mod stock_status;
pub mod transfer_requests;
pub mod unit_display;

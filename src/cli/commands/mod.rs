pub(super) mod check;
pub(super) mod export;
pub(super) mod import;
pub(super) mod migrate;
pub(super) mod show;

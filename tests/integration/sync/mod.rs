mod multi_client;
mod persistence;
mod presence;

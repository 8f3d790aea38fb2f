mod client;

pub use client::DockerAdapter;

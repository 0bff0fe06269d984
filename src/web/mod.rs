// Server-rendered HTML front-end

pub mod handlers;

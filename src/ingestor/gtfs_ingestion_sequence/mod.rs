pub mod routes_into_postgres;
pub mod shapes_into_postgres;
pub mod stop_times_into_postgres;
pub mod stops_into_postgres;
pub mod trips_into_postgres;

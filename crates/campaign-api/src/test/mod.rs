mod pg_repositories_test;
mod router_test;

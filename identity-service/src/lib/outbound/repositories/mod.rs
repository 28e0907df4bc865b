mod memory;
mod postgres;

pub use memory::InMemoryIdentityRepository;
pub use memory::InMemoryRoleRepository;
pub use postgres::PostgresIdentityRepository;
pub use postgres::PostgresRoleRepository;

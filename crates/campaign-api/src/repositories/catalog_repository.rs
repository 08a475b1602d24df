//! Customer, technician and meter repository trait (port)

use async_trait::async_trait;

use crate::domain::{
    Customer, CustomerFilter, CustomerInput, DomainError, MeterFilter, MeterInput,
    MeterRenovation, Technician, TechnicianFilter, TechnicianInput,
};
use crate::utils::{PageRequest, Paged};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paged<Customer>, DomainError>;
    async fn find_customer(&self, id: i32) -> Result<Option<Customer>, DomainError>;
    async fn create_customer(&self, input: &CustomerInput) -> Result<Customer, DomainError>;
    async fn update_customer(&self, id: i32, input: &CustomerInput) -> Result<Customer, DomainError>;

    async fn list_technicians(
        &self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> Result<Paged<Technician>, DomainError>;
    async fn create_technician(&self, input: &TechnicianInput) -> Result<Technician, DomainError>;
    async fn update_technician(
        &self,
        id: i32,
        input: &TechnicianInput,
    ) -> Result<Technician, DomainError>;
    async fn delete_technician(&self, id: i32) -> Result<(), DomainError>;

    async fn list_meters(
        &self,
        filter: &MeterFilter,
        page: PageRequest,
    ) -> Result<Paged<MeterRenovation>, DomainError>;
    async fn create_meter(&self, input: &MeterInput) -> Result<MeterRenovation, DomainError>;
    async fn update_meter(&self, id: i32, input: &MeterInput) -> Result<MeterRenovation, DomainError>;
}

//! Customers, technicians and replacement meters

use std::sync::Arc;
use tracing::info;

use crate::domain::{
    Customer, CustomerFilter, CustomerInput, DomainError, MeterFilter, MeterInput,
    MeterRenovation, Technician, TechnicianFilter, TechnicianInput,
};
use crate::repositories::CatalogRepository;
use crate::utils::{PageRequest, Paged};

pub struct CatalogService {
    repo: Arc<dyn CatalogRepository>,
}

impl CatalogService {
    pub fn new(repo: Arc<dyn CatalogRepository>) -> Self {
        Self { repo }
    }

    pub async fn list_customers(
        &self,
        filter: &CustomerFilter,
        page: PageRequest,
    ) -> Result<Paged<Customer>, DomainError> {
        self.repo.list_customers(filter, page).await
    }

    pub async fn get_customer(&self, id: i32) -> Result<Customer, DomainError> {
        self.repo
            .find_customer(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("Cliente {} no encontrado", id)))
    }

    pub async fn create_customer(&self, mut input: CustomerInput) -> Result<Customer, DomainError> {
        input.validate()?;
        let customer = self.repo.create_customer(&input).await?;
        info!("Customer {} created (id={})", customer.inscription, customer.id);
        Ok(customer)
    }

    pub async fn update_customer(&self, id: i32, mut input: CustomerInput) -> Result<Customer, DomainError> {
        input.validate()?;
        self.repo.update_customer(id, &input).await
    }

    pub async fn list_technicians(
        &self,
        filter: &TechnicianFilter,
        page: PageRequest,
    ) -> Result<Paged<Technician>, DomainError> {
        self.repo.list_technicians(filter, page).await
    }

    pub async fn create_technician(&self, mut input: TechnicianInput) -> Result<Technician, DomainError> {
        input.validate()?;
        let technician = self.repo.create_technician(&input).await?;
        info!("Technician {} created (id={})", technician.dni, technician.id);
        Ok(technician)
    }

    pub async fn update_technician(
        &self,
        id: i32,
        mut input: TechnicianInput,
    ) -> Result<Technician, DomainError> {
        input.validate()?;
        self.repo.update_technician(id, &input).await
    }

    pub async fn delete_technician(&self, id: i32) -> Result<(), DomainError> {
        self.repo.delete_technician(id).await?;
        info!("Technician {} deleted", id);
        Ok(())
    }

    pub async fn list_meters(
        &self,
        filter: &MeterFilter,
        page: PageRequest,
    ) -> Result<Paged<MeterRenovation>, DomainError> {
        self.repo.list_meters(filter, page).await
    }

    pub async fn create_meter(&self, mut input: MeterInput) -> Result<MeterRenovation, DomainError> {
        input.validate()?;
        let meter = self.repo.create_meter(&input).await?;
        info!("Meter {} registered (id={})", meter.serial, meter.id);
        Ok(meter)
    }

    pub async fn update_meter(&self, id: i32, mut input: MeterInput) -> Result<MeterRenovation, DomainError> {
        input.validate()?;
        self.repo.update_meter(id, &input).await
    }
}

use uuid::Uuid;

use motoreal_domain::{Snapshot, Vehicle};

use crate::validation::{normalize_plate, validate_plate, validate_vehicle};
use crate::CoreError;

pub struct VehicleService;

impl VehicleService {
    /// Adds a vehicle after normalizing its plate and rejecting duplicates.
    pub fn add(snapshot: &mut Snapshot, mut vehicle: Vehicle) -> Result<Uuid, CoreError> {
        vehicle.plate = validate_plate(&vehicle.plate)?;
        validate_vehicle(&vehicle)?;
        Self::ensure_unique_plate(snapshot, &vehicle.plate, None)?;
        let id = vehicle.id;
        snapshot.vehicles.push(vehicle);
        Ok(id)
    }

    /// Replaces the stored vehicle with the same id.
    pub fn update(snapshot: &mut Snapshot, mut vehicle: Vehicle) -> Result<(), CoreError> {
        vehicle.plate = validate_plate(&vehicle.plate)?;
        validate_vehicle(&vehicle)?;
        Self::ensure_unique_plate(snapshot, &vehicle.plate, Some(vehicle.id))?;
        let slot = snapshot
            .vehicle_mut(vehicle.id)
            .ok_or_else(|| CoreError::VehicleNotFound(vehicle.id.to_string()))?;
        *slot = vehicle;
        Ok(())
    }

    /// Soft-deletes a vehicle. Its transactions stay in place.
    pub fn archive(snapshot: &mut Snapshot, id: Uuid) -> Result<(), CoreError> {
        let vehicle = snapshot
            .vehicle_mut(id)
            .ok_or_else(|| CoreError::VehicleNotFound(id.to_string()))?;
        if vehicle.is_archived {
            return Err(CoreError::InvalidOperation(format!(
                "vehicle {} is already archived",
                vehicle.plate
            )));
        }
        vehicle.is_archived = true;
        Ok(())
    }

    /// Increments the paid-installment counter, returning the new count.
    pub fn mark_installment_paid(snapshot: &mut Snapshot, id: Uuid) -> Result<u32, CoreError> {
        let vehicle = snapshot
            .vehicle_mut(id)
            .ok_or_else(|| CoreError::VehicleNotFound(id.to_string()))?;
        let plate = vehicle.plate.clone();
        let terms = vehicle.financing_mut().ok_or_else(|| {
            CoreError::InvalidOperation(format!("vehicle {plate} is not financed"))
        })?;
        terms.mark_paid();
        Ok(terms.paid_months)
    }

    /// Looks a vehicle up by plate, accepting unformatted input.
    pub fn find_by_plate<'a>(snapshot: &'a Snapshot, plate: &str) -> Result<&'a Vehicle, CoreError> {
        let normalized = normalize_plate(plate);
        snapshot
            .vehicle_by_plate(&normalized)
            .ok_or_else(|| CoreError::VehicleNotFound(plate.trim().to_string()))
    }

    fn ensure_unique_plate(
        snapshot: &Snapshot,
        plate: &str,
        except: Option<Uuid>,
    ) -> Result<(), CoreError> {
        let taken = snapshot
            .vehicles
            .iter()
            .any(|existing| existing.plate == plate && Some(existing.id) != except);
        if taken {
            Err(CoreError::Validation(format!(
                "plate {plate} is already registered"
            )))
        } else {
            Ok(())
        }
    }
}

use glam::f32::Vec2;
use serde::Serialize;

use crate::{
    math_helpers::{heading, SteerVec},
    options::RunOptions,
};

/// Fatigue below this value counts as rested.
pub const RESTED_BELOW: f32 = 20.;
/// Fatigue below this value (and not rested) counts as tired.
pub const TIRED_BELOW: f32 = 50.;

/// Coarse presentation of the continuous fatigue value, e.g. for colour mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FatigueBand {
    Rested,
    Tired,
    Fatigued,
}

impl FatigueBand {
    pub fn from_fatigue(fatigue: f32) -> Self {
        if fatigue < RESTED_BELOW {
            FatigueBand::Rested
        } else if fatigue < TIRED_BELOW {
            FatigueBand::Tired
        } else {
            FatigueBand::Fatigued
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Boid {
    // sequential id starting from 0, used to skip self when scanning the population
    pub id: usize,
    pub position: Vec2,
    pub velocity: Vec2,
    turn_factor: f32,
    fatigue: f32,
    max_fatigue: f32,
    fatigue_rate: f32,
}

impl Boid {
    /// Creates a new rested [`Boid`] with the default fatigue parameters.
    pub fn new(x: f32, y: f32, velocity: Vec2, id: usize, turn_factor: f32) -> Self {
        Boid {
            id,
            position: Vec2::new(x, y),
            velocity,
            turn_factor,
            fatigue: 0.,
            max_fatigue: 50.,
            fatigue_rate: 0.5,
        }
    }

    /// A negative or NaN `max_fatigue` is taken as 0.
    pub fn with_fatigue(mut self, max_fatigue: f32, fatigue_rate: f32) -> Self {
        self.max_fatigue = max_fatigue.max(0.);
        self.fatigue_rate = fatigue_rate;
        self.fatigue = self.fatigue.clamp(0., max_fatigue);
        self
    }

    /// Creates a boid carrying the per-agent defaults of `run_options`.
    pub fn from_options(x: f32, y: f32, velocity: Vec2, id: usize, run_options: &RunOptions) -> Self {
        Boid::new(x, y, velocity, id, run_options.turn_factor)
            .with_fatigue(run_options.max_fatigue, run_options.fatigue_rate)
    }

    pub fn turn_factor(&self) -> f32 {
        self.turn_factor
    }

    /// Always within `[0, max_fatigue]`.
    pub fn fatigue(&self) -> f32 {
        self.fatigue
    }

    pub fn max_fatigue(&self) -> f32 {
        self.max_fatigue
    }

    pub fn fatigue_rate(&self) -> f32 {
        self.fatigue_rate
    }

    pub fn fatigue_band(&self) -> FatigueBand {
        FatigueBand::from_fatigue(self.fatigue)
    }

    /// Heading in radians, for orienting the rendered shape.
    pub fn heading(&self) -> f32 {
        heading(self.velocity)
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite() && self.velocity.is_finite() && self.fatigue.is_finite()
    }

    /// Advances the boid by one tick: computes the steer from `others` and integrates it.
    ///
    /// `others` may contain this boid, it is skipped by id. Bounds of zero disable wall
    /// avoidance.
    pub fn step(&mut self, others: &[Boid], width: f32, height: f32, run_options: &RunOptions) {
        let steer = self.run_rules(others, width, height, run_options);
        self.update_location(steer, run_options);
    }

    /// Blends all active behaviours into one steer clamped to `turn_factor`.
    ///
    /// Updates the fatigue accumulator as a side effect when fatigue is modelled.
    pub fn run_rules(
        &mut self,
        others: &[Boid],
        width: f32,
        height: f32,
        run_options: &RunOptions,
    ) -> Vec2 {
        let mut sum = Vec2::ZERO;

        if run_options.separation_on {
            sum += self.separation(others, run_options) * run_options.separation_coefficient;
        }

        if run_options.alignment_on {
            sum += self.alignment(others, run_options) * run_options.alignment_coefficient;
        }

        if run_options.cohesion_on {
            sum += self.cohesion(others, run_options) * run_options.cohesion_coefficient;
        }

        if run_options.wall_avoidance_on && width != 0. && height != 0. {
            sum += self.avoid_walls(width, height, run_options.wall_margin)
                * run_options.wall_coefficient;
        }

        if run_options.fatigue_on {
            let visible = self
                .neighbours_within(others, run_options.fatigue_distance, run_options)
                .count();
            self.update_fatigue(visible, run_options.fatigue_neighbour_threshold);
            sum += self.fatigue_force(run_options.fatigue_drag) * run_options.fatigue_coefficient;
        }

        sum.limit(self.turn_factor)
    }

    // Actually shifts the individual's location
    pub fn update_location(&mut self, steer: Vec2, run_options: &RunOptions) {
        let steered = self.velocity + steer;
        self.velocity = self
            .velocity
            .lerp_unclamped(steered, run_options.velocity_blend)
            .limit(run_options.max_speed);

        if let Some(min_speed) = run_options.min_speed {
            self.velocity = self.velocity.bottom_limit(min_speed);
        }

        self.position += self.velocity;
    }

    /// Whether `other` lies within `fov_rad` of the current heading.
    ///
    /// A boid without velocity has no heading, the angle then reads as π.
    pub fn can_see(&self, other: &Boid, fov_rad: f32) -> bool {
        (other.position - self.position).angle_between_or_pi(self.velocity) <= fov_rad
    }

    /// Other boids at a distance in the open interval `(0, radius)`, with that distance.
    ///
    /// When the field of vision is on, only the visible ones are yielded.
    fn neighbours_within<'a>(
        &'a self,
        others: &'a [Boid],
        radius: f32,
        run_options: &RunOptions,
    ) -> impl Iterator<Item = (&'a Boid, f32)> + 'a {
        let fov_rad = run_options
            .field_of_vision_on
            .then(|| run_options.field_of_vision_rad());

        others
            .iter()
            .filter(move |other| other.id != self.id)
            .map(move |other| (other, self.position.distance_to(other.position)))
            .filter(move |(_, distance)| *distance > 0. && *distance < radius)
            .filter(move |(other, _)| match fov_rad {
                Some(fov_rad) => self.can_see(other, fov_rad),
                None => true,
            })
    }

    pub fn separation(&self, others: &[Boid], run_options: &RunOptions) -> Vec2 {
        let mut steer = Vec2::ZERO;
        let mut count = 0;

        for (other, distance) in
            self.neighbours_within(others, run_options.separation_distance, run_options)
        {
            // closer neighbours push harder
            steer += (self.position - other.position)
                .normalize_or_self()
                .div_or_zero(distance);
            count += 1;
        }

        if count > 0 {
            steer = steer.div_or_zero(count as f32).normalize_or_self() * self.turn_factor;
        }

        steer
    }

    pub fn alignment(&self, others: &[Boid], run_options: &RunOptions) -> Vec2 {
        let mut avg = Vec2::ZERO;
        let mut count = 0;

        for (other, _) in
            self.neighbours_within(others, run_options.alignment_distance, run_options)
        {
            avg += other.velocity;
            count += 1;
        }

        if count > 0 {
            avg = avg.div_or_zero(count as f32).normalize_or_self() * self.turn_factor;
            avg - self.velocity
        } else {
            Vec2::ZERO
        }
    }

    pub fn cohesion(&self, others: &[Boid], run_options: &RunOptions) -> Vec2 {
        let mut center = Vec2::ZERO;
        let mut count = 0;

        for (other, _) in self.neighbours_within(others, run_options.cohesion_distance, run_options)
        {
            center += other.position;
            count += 1;
        }

        if count > 0 {
            center = center.div_or_zero(count as f32);
            (center - self.position).normalize_or_self() * self.turn_factor
        } else {
            Vec2::ZERO
        }
    }

    /// Pushes inward along each axis whose edge is closer than `margin`.
    ///
    /// Axes are independent and the result is not normalized.
    pub fn avoid_walls(&self, width: f32, height: f32, margin: f32) -> Vec2 {
        let mut steer = Vec2::ZERO;

        if self.position.x < margin {
            steer.x = self.turn_factor;
        }
        if self.position.x > width - margin {
            steer.x = -self.turn_factor;
        }
        if self.position.y < margin {
            steer.y = self.turn_factor;
        }
        if self.position.y > height - margin {
            steer.y = -self.turn_factor;
        }

        steer
    }

    /// Too few visible neighbours tire the boid, enough of them let it recover.
    pub fn update_fatigue(&mut self, visible: usize, threshold: usize) {
        let delta = if visible < threshold {
            (threshold - visible) as f32 * self.fatigue_rate
        } else {
            -((visible - threshold) as f32 * self.fatigue_rate)
        };

        self.fatigue = (self.fatigue + delta).clamp(0., self.max_fatigue);
    }

    /// Drag against the current heading, proportional to fatigue.
    pub fn fatigue_force(&self, drag: f32) -> Vec2 {
        self.velocity.normalize_or_self() * (-drag * self.fatigue)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::Vec2;
    use rstest::rstest;

    use super::{Boid, FatigueBand};
    use crate::options::RunOptions;

    macro_rules! assert_eqf32 {
        ($x:expr, $y:expr) => {
            assert_relative_eq!($x, $y, epsilon = 1e-4_f32)
        };
    }

    fn boid(id: usize, x: f32, y: f32, vx: f32, vy: f32) -> Boid {
        Boid::new(x, y, Vec2::new(vx, vy), id, 1.2)
    }

    #[test]
    fn lonely_boid_feels_no_flock_forces() {
        let ro = RunOptions::classic();
        let b = boid(0, 400., 300., 1., 0.);
        let population = [b];

        assert_eq!(b.separation(&population, &ro), Vec2::ZERO);
        assert_eq!(b.alignment(&population, &ro), Vec2::ZERO);
        assert_eq!(b.cohesion(&population, &ro), Vec2::ZERO);
    }

    #[test]
    fn neighbours_outside_radius_are_ignored() {
        let ro = RunOptions::classic();
        let b = boid(0, 100., 100., 1., 0.);
        // exactly on the separation radius
        let on_separation_edge = [b, boid(1, 120., 100., 0., 1.)];
        // exactly on the alignment and cohesion radii
        let on_flock_edge = [b, boid(2, 100., 125., 0., 1.)];

        assert_eq!(b.separation(&on_separation_edge, &ro), Vec2::ZERO);
        assert_eq!(b.alignment(&on_flock_edge, &ro), Vec2::ZERO);
        assert_eq!(b.cohesion(&on_flock_edge, &ro), Vec2::ZERO);
    }

    #[test]
    fn coincident_boids_do_not_influence_each_other() {
        let ro = RunOptions::classic();
        let a = boid(0, 50., 50., 1., 0.);
        let b = boid(1, 50., 50., -1., 0.);
        let population = [a, b];

        for force in [
            a.separation(&population, &ro),
            a.alignment(&population, &ro),
            a.cohesion(&population, &ro),
        ] {
            assert_eq!(force, Vec2::ZERO);
        }
    }

    #[test]
    fn separation_pushes_pair_apart_symmetrically() {
        let ro = RunOptions::classic();
        let a = boid(0, 100., 100., 1., 0.);
        let b = boid(1, 110., 100., 1., 0.);
        let population = [a, b];

        let sep_a = a.separation(&population, &ro);
        let sep_b = b.separation(&population, &ro);

        assert_eqf32!(sep_a.x, -1.2);
        assert_eqf32!(sep_a.y, 0.);
        assert_eqf32!(sep_a.length(), a.turn_factor());
        assert_eq!(sep_a, -sep_b);
    }

    #[test]
    fn alignment_steers_towards_mean_heading() {
        let ro = RunOptions::classic();
        let a = boid(0, 100., 100., 1., 0.);
        let population = [a, boid(1, 110., 100., 0., 2.), boid(2, 100., 110., 0., 4.)];

        let steer = a.alignment(&population, &ro);

        // mean velocity (0, 3) -> unit (0, 1) * 1.2 - (1, 0)
        assert_eqf32!(steer.x, -1.);
        assert_eqf32!(steer.y, 1.2);
    }

    #[test]
    fn cohesion_steers_towards_centroid() {
        let ro = RunOptions::classic();
        let a = boid(0, 100., 100., 1., 0.);
        let population = [a, boid(1, 110., 110., 0., 1.), boid(2, 110., 90., 0., 1.)];

        let steer = a.cohesion(&population, &ro);

        assert_eqf32!(steer.x, 1.2);
        assert_eqf32!(steer.y, 0.);
    }

    #[rstest]
    #[case(5., 300., Vec2::new(1.2, 0.))]
    #[case(795., 300., Vec2::new(-1.2, 0.))]
    #[case(400., 5., Vec2::new(0., 1.2))]
    #[case(400., 590., Vec2::new(0., -1.2))]
    #[case(0., 0., Vec2::new(1.2, 1.2))]
    #[case(400., 300., Vec2::ZERO)]
    fn walls_push_inward_per_axis(#[case] x: f32, #[case] y: f32, #[case] expected: Vec2) {
        let b = boid(0, x, y, 1., 0.);
        assert_eq!(b.avoid_walls(800., 600., 20.), expected);
    }

    #[test]
    fn field_of_vision_hides_boids_behind() {
        let ro = RunOptions {
            field_of_vision_on: true,
            field_of_vision_deg: 120.,
            ..RunOptions::classic()
        };
        let a = boid(0, 100., 100., 1., 0.);
        let ahead = boid(1, 110., 100., 1., 0.);
        let behind = boid(2, 90., 100., 1., 0.);

        assert!(a.can_see(&ahead, ro.field_of_vision_rad()));
        assert!(!a.can_see(&behind, ro.field_of_vision_rad()));

        assert_eq!(a.separation(&[a, behind], &ro), Vec2::ZERO);
        assert_ne!(a.separation(&[a, ahead], &ro), Vec2::ZERO);
    }

    #[test]
    fn stationary_boid_sees_nothing_with_narrow_field_of_vision() {
        let ro = RunOptions {
            field_of_vision_on: true,
            field_of_vision_deg: 120.,
            ..RunOptions::classic()
        };
        let still = boid(0, 100., 100., 0., 0.);
        let ahead = boid(1, 110., 100., 1., 0.);

        assert!(!still.can_see(&ahead, ro.field_of_vision_rad()));
        assert_eq!(still.cohesion(&[still, ahead], &ro), Vec2::ZERO);
        assert!(still.can_see(&ahead, std::f32::consts::PI));
    }

    #[rstest]
    #[case(-1.)]
    #[case(f32::NAN)]
    fn degenerate_max_fatigue_pins_fatigue_at_zero(#[case] max_fatigue: f32) {
        let mut b = boid(0, 0., 0., 1., 0.).with_fatigue(max_fatigue, 0.5);
        assert_eq!(b.max_fatigue(), 0.);

        b.update_fatigue(0, 4);
        assert_eq!(b.fatigue(), 0.);
        b.update_fatigue(9, 4);
        assert_eq!(b.fatigue(), 0.);
    }

    #[test]
    fn lone_boid_in_corner_only_avoids_walls() {
        let ro = RunOptions {
            max_speed: 10.,
            ..RunOptions::classic()
        };
        let mut b = boid(0, 0., 0., 1., 0.);
        let population = [b];

        let mut probe = b;
        let steer = probe.run_rules(&population, 800., 600., &ro);
        // wall force (1.2, 1.2) weighted by 2, clamped back to the turn factor
        assert_eqf32!(steer.length(), 1.2);
        assert_eqf32!(steer.x, steer.y);

        b.step(&population, 800., 600., &ro);

        let expected = Vec2::new(1., 0.) + steer;
        assert_eqf32!(b.velocity.x, expected.x);
        assert_eqf32!(b.velocity.y, expected.y);
        assert!(b.velocity.length() <= 10.);
        assert_eq!(b.position, b.velocity);
    }

    #[test]
    fn zero_bounds_disable_wall_avoidance() {
        let ro = RunOptions::classic();
        let mut b = boid(0, 0., 0., 1., 0.);

        let population = [b];
        let steer = b.run_rules(&population, 0., 0., &ro);

        assert_eq!(steer, Vec2::ZERO);
    }

    #[test]
    fn velocity_is_clamped_to_max_speed() {
        let ro = RunOptions::classic();
        let mut b = boid(0, 400., 300., 50., 0.);

        let population = [b];
        b.step(&population, 800., 600., &ro);

        assert_eqf32!(b.velocity.length(), ro.max_speed);
    }

    #[test]
    fn velocity_is_floored_to_min_speed() {
        let ro = RunOptions {
            min_speed: Some(2.),
            ..RunOptions::classic()
        };
        let mut b = boid(0, 400., 300., 0.5, 0.);

        let population = [b];
        b.step(&population, 800., 600., &ro);

        assert_eqf32!(b.velocity.x, 2.);
        assert_eqf32!(b.velocity.y, 0.);
    }

    #[test]
    fn stationary_boid_stays_stationary_under_min_speed() {
        let ro = RunOptions {
            min_speed: Some(2.),
            ..RunOptions::classic()
        };
        let mut b = boid(0, 400., 300., 0., 0.);

        let population = [b];
        b.step(&population, 800., 600., &ro);

        assert_eq!(b.velocity, Vec2::ZERO);
        assert!(!b.position.is_nan());
    }

    #[test]
    fn velocity_blend_smooths_the_steer() {
        let ro = RunOptions {
            velocity_blend: 0.5,
            ..RunOptions::classic()
        };
        let mut b = boid(0, 5., 300., 1., 0.);

        let population = [b];
        b.step(&population, 800., 600., &ro);

        // steer (1.2, 0) -> halfway between (1, 0) and (2.2, 0)
        assert_eqf32!(b.velocity.x, 1.6);
        assert_eqf32!(b.velocity.y, 0.);
    }

    #[test]
    fn lone_boid_tires() {
        let ro = RunOptions::default();
        let mut b = Boid::from_options(400., 300., Vec2::new(3., 0.), 0, &ro);

        let population = [b];
        b.step(&population, 800., 600., &ro);

        // four neighbours missing, 0.5 each
        assert_eqf32!(b.fatigue(), 2.);
    }

    #[test]
    fn fatigue_recovers_with_company() {
        let mut b = boid(0, 0., 0., 1., 0.);
        b.update_fatigue(0, 4);
        b.update_fatigue(0, 4);
        assert_eqf32!(b.fatigue(), 4.);

        b.update_fatigue(6, 4);
        assert_eqf32!(b.fatigue(), 3.);

        b.update_fatigue(4, 4);
        assert_eqf32!(b.fatigue(), 3.);
    }

    #[rstest]
    #[case(&[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0])]
    #[case(&[40, 0, 12, 3, 3, 90, 1, 0, 0, 7])]
    #[case(&[2, 1, 0, 2, 1, 0, 2, 1, 0, 2, 1, 0, 2, 1, 0, 2, 1, 0, 2, 1, 0, 2, 1, 0])]
    fn fatigue_stays_within_bounds(#[case] history: &[usize]) {
        let mut b = boid(0, 0., 0., 1., 0.).with_fatigue(10., 1.5);

        for &visible in history.iter().cycle().take(200) {
            b.update_fatigue(visible, 4);
            assert!(b.fatigue() >= 0.);
            assert!(b.fatigue() <= b.max_fatigue());
        }
    }

    #[test]
    fn fatigue_drags_against_heading() {
        let mut b = boid(0, 0., 0., 3., 0.);
        for _ in 0..5 {
            b.update_fatigue(0, 4);
        }
        assert_eqf32!(b.fatigue(), 10.);

        let drag = b.fatigue_force(0.03);
        assert_eqf32!(drag.x, -0.3);
        assert_eqf32!(drag.y, 0.);
    }

    #[rstest]
    #[case(0., FatigueBand::Rested)]
    #[case(19.9, FatigueBand::Rested)]
    #[case(20., FatigueBand::Tired)]
    #[case(49.9, FatigueBand::Tired)]
    #[case(50., FatigueBand::Fatigued)]
    fn fatigue_bands(#[case] fatigue: f32, #[case] expected: FatigueBand) {
        assert_eq!(FatigueBand::from_fatigue(fatigue), expected);
    }

    #[test]
    fn heading_points_along_velocity() {
        let b = boid(0, 0., 0., 0., -2.);
        assert_eqf32!(b.heading(), -std::f32::consts::FRAC_PI_2);
    }
}
